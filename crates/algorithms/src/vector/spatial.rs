//! Bounding boxes and closest-point helpers

use geo::{BoundingRect, Closest, ClosestPoint, CoordsIter, Geometry, Point};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Box spanning two arbitrary corners
    pub fn from_corners((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> Self {
        Self::new(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }
}

/// Compute the bounding box of a geometry
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect().map(|rect| BoundingBox {
        min_x: rect.min().x,
        min_y: rect.min().y,
        max_x: rect.max().x,
        max_y: rect.max().y,
    })
}

/// Where a geometry comes closest to a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nearest {
    /// The point lies on (or inside) the geometry
    OnGeometry,
    /// Closest point and its planar distance
    At(Point<f64>, f64),
}

impl Nearest {
    pub fn distance(&self) -> f64 {
        match self {
            Nearest::OnGeometry => 0.0,
            Nearest::At(_, d) => *d,
        }
    }
}

/// Planar closest point of `geom` to `p`.
///
/// Degenerate segments make `geo` report an indeterminate answer; the nearest
/// vertex is used then. `None` only for a geometry without coordinates.
pub fn nearest_on(geom: &Geometry<f64>, p: Point<f64>) -> Option<Nearest> {
    let dist = |q: Point<f64>| (q.x() - p.x()).hypot(q.y() - p.y());

    match geom.closest_point(&p) {
        Closest::Intersection(_) => Some(Nearest::OnGeometry),
        Closest::SinglePoint(q) => Some(Nearest::At(q, dist(q))),
        Closest::Indeterminate => geom
            .coords_iter()
            .map(Point::from)
            .map(|q| (q, dist(q)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(q, d)| if d == 0.0 { Nearest::OnGeometry } else { Nearest::At(q, d) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    #[test]
    fn test_bounding_box() {
        let line: Geometry<f64> = LineString::from(vec![(0.0, 1.0), (2.0, -1.0)]).into();
        let bb = bounding_box(&line).unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, -1.0, 2.0, 1.0));
        assert_eq!(BoundingBox::from_corners((2.0, -1.0), (0.0, 1.0)), bb);
    }

    #[test]
    fn test_nearest_on_line() {
        let line: Geometry<f64> = LineString::from(vec![(0.0, 0.0), (0.0, 10.0)]).into();
        let Some(Nearest::At(q, d)) = nearest_on(&line, Point::new(3.0, 5.0)) else {
            panic!("expected a single closest point");
        };
        assert_eq!((q.x(), q.y()), (0.0, 5.0));
        assert_eq!(d, 3.0);

        assert_eq!(nearest_on(&line, Point::new(0.0, 5.0)).map(|n| n.distance()), Some(0.0));
    }

    #[test]
    fn test_nearest_inside_polygon() {
        let square: Geometry<f64> = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![],
        )
        .into();
        assert_eq!(nearest_on(&square, Point::new(2.0, 2.0)), Some(Nearest::OnGeometry));
        assert_eq!(nearest_on(&square, Point::new(6.0, 2.0)).map(|n| n.distance()), Some(2.0));
    }

    #[test]
    fn test_nearest_degenerate_line() {
        let stub: Geometry<f64> = LineString::from(vec![(1.0, 1.0), (1.0, 1.0)]).into();
        let n = nearest_on(&stub, Point::new(4.0, 5.0)).unwrap();
        assert_eq!(n.distance(), 5.0);
    }
}
