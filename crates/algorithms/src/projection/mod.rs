//! Point-centered local metric projection
//!
//! An equirectangular approximation around a reference point: 111 320 m per
//! degree of latitude and 111 320 * cos(lat0) m per degree of longitude. Good
//! for a few hundred meters to a few kilometers; not geodesic.

mod reproject;

pub use reproject::{parse_utm_epsg, to_raster_crs};

use geo::MapCoords;

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Lower bound for cos(lat0), keeps the longitude scale finite at the poles
const MIN_COS_LAT: f64 = 1e-9;

/// Meters per degree `(longitude, latitude)` at latitude `lat`
pub fn meters_per_degree(lat: f64) -> (f64, f64) {
    let cos_lat = lat.to_radians().cos().max(MIN_COS_LAT);
    (METERS_PER_DEGREE * cos_lat, METERS_PER_DEGREE)
}

/// Forward/inverse transform pair centered at `(lon0, lat0)`.
///
/// `forward(lon0, lat0) == (0, 0)` and `inverse` is the algebraic inverse of
/// `forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    lon0: f64,
    lat0: f64,
    mx: f64,
    my: f64,
}

impl LocalProjection {
    pub fn new(lon0: f64, lat0: f64) -> Self {
        let (mx, my) = meters_per_degree(lat0);
        Self { lon0, lat0, mx, my }
    }

    /// Reference point `(lon0, lat0)`
    pub fn origin(&self) -> (f64, f64) {
        (self.lon0, self.lat0)
    }

    /// Meters per degree `(longitude, latitude)` at the reference latitude
    pub fn scale(&self) -> (f64, f64) {
        (self.mx, self.my)
    }

    /// Degrees to local meters
    #[inline]
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        ((lon - self.lon0) * self.mx, (lat - self.lat0) * self.my)
    }

    /// Local meters to degrees
    #[inline]
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.mx + self.lon0, y / self.my + self.lat0)
    }

    /// Reproject any geo geometry from degrees into the local plane
    pub fn project<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        geometry.map_coords(|c| {
            let (x, y) = self.forward(c.x, c.y);
            geo::Coord { x, y }
        })
    }

    /// Reproject a geometry from the local plane back to degrees
    pub fn unproject<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        geometry.map_coords(|c| {
            let (x, y) = self.inverse(c.x, c.y);
            geo::Coord { x, y }
        })
    }
}

/// Build the `(forward, inverse)` closures of a projection centered at
/// `(lon0, lat0)`.
pub fn make_projection(
    lon0: f64,
    lat0: f64,
) -> (
    impl Fn(f64, f64) -> (f64, f64) + Copy,
    impl Fn(f64, f64) -> (f64, f64) + Copy,
) {
    let p = LocalProjection::new(lon0, lat0);
    (
        move |lon, lat| p.forward(lon, lat),
        move |x, y| p.inverse(x, y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Geometry, LineString};

    #[test]
    fn test_origin_maps_to_zero() {
        let (forward, _) = make_projection(-49.27, -25.43);
        assert_eq!(forward(-49.27, -25.43), (0.0, 0.0));
    }

    #[test]
    fn test_forward_inverse_roundtrip() {
        let (forward, inverse) = make_projection(-49.27, -25.43);
        for &(lon, lat) in &[(-49.27, -25.43), (-49.2651, -25.4409), (-49.30, -25.40), (-49.20, -25.50)] {
            let (x, y) = forward(lon, lat);
            let (lon2, lat2) = inverse(x, y);
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_scale_factors() {
        let (mx, my) = meters_per_degree(0.0);
        assert_relative_eq!(mx, 111_320.0);
        assert_relative_eq!(my, 111_320.0);

        let (mx, _) = meters_per_degree(60.0);
        assert_relative_eq!(mx, 55_660.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pole_is_clamped() {
        let p = LocalProjection::new(10.0, 90.0);
        let (mx, _) = p.scale();
        assert!(mx > 0.0);
        let (lon, lat) = p.inverse(1.0, 1.0);
        assert!(lon.is_finite());
        assert!(lat.is_finite());
    }

    #[test]
    fn test_project_geometry() {
        let p = LocalProjection::new(0.0, 0.0);
        let line: Geometry<f64> = LineString::from(vec![(0.0, 0.0), (0.001, 0.0)]).into();
        let projected = p.project(&line);
        let Geometry::LineString(ls) = &projected else {
            panic!("expected a LineString");
        };
        assert_relative_eq!(ls.0[1].x, 111.32, epsilon = 1e-9);

        let back = p.unproject(&projected);
        assert_eq!(back, line);
    }
}
