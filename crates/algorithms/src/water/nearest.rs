//! Nearest-water resolution
//!
//! The R-tree proposes candidates in degree space; each candidate is then
//! measured exactly in a local metric plane centered on the query point, and
//! the closest point found there is mapped back to degrees.

use crate::maybe_rayon::*;
use crate::projection::LocalProjection;
use crate::store::{FeatureId, FeatureStore};
use crate::vector::{Nearest, nearest_on};
use geo::Point;
use georisk_core::{Error, Result};
use serde::Serialize;

/// Distance from a query point to the water feature chosen for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestWater {
    /// Ground distance in meters (local equirectangular approximation)
    pub distance_m: f64,
    pub feature_id: FeatureId,
    /// Closest point on the feature, `(lon, lat)`
    pub nearest_point: (f64, f64),
}

/// Resolve the water feature nearest to `(lon, lat)`.
///
/// Uses the single degree-space candidate from the index. Away from the
/// equator that candidate is not guaranteed to be the metrically nearest
/// feature; the distance returned is exact for the candidate chosen. See
/// [`resolve_among`] for a top-k refinement.
pub fn resolve(store: &FeatureStore, lon: f64, lat: f64) -> Result<NearestWater> {
    resolve_among(store, lon, lat, 1)
}

/// Resolve against the `k` nearest degree-space candidates and keep the one
/// with the smallest metric distance. `k = 1` behaves exactly like
/// [`resolve`]; `k = 0` is treated as 1.
pub fn resolve_among(store: &FeatureStore, lon: f64, lat: f64, k: usize) -> Result<NearestWater> {
    if store.is_empty() {
        return Err(Error::EmptyCollection);
    }

    let candidates = store.nearest_k(lon, lat, k.max(1))?;
    if candidates.is_empty() {
        return Err(Error::EmptyCollection);
    }

    let projection = LocalProjection::new(lon, lat);
    let mut best: Option<NearestWater> = None;

    for id in candidates {
        let measured = measure(store, &projection, id)?;
        if best.is_none_or(|b| measured.distance_m < b.distance_m) {
            best = Some(measured);
        }
    }

    let best = best.ok_or(Error::EmptyCollection)?;
    tracing::debug!(
        lon,
        lat,
        feature = best.feature_id,
        distance_m = best.distance_m,
        "resolved nearest water"
    );
    Ok(best)
}

/// Resolve many points; runs in parallel with the `parallel` feature.
/// Results come back in input order.
pub fn resolve_many(store: &FeatureStore, points: &[(f64, f64)], k: usize) -> Vec<Result<NearestWater>> {
    points
        .into_par_iter()
        .map(|&(lon, lat)| resolve_among(store, lon, lat, k))
        .collect()
}

/// Exact metric distance from the projection origin to feature `id`
fn measure(store: &FeatureStore, projection: &LocalProjection, id: FeatureId) -> Result<NearestWater> {
    let feature = store.feature(id)?;
    let local = projection.project(&feature.geometry);
    let origin = projection.origin();

    let nearest = nearest_on(&local, Point::new(0.0, 0.0)).ok_or_else(|| {
        Error::Algorithm(format!("feature {} has no coordinates to measure against", id))
    })?;

    Ok(match nearest {
        Nearest::OnGeometry => NearestWater {
            distance_m: 0.0,
            feature_id: id,
            nearest_point: origin,
        },
        Nearest::At(q, d) => NearestWater {
            distance_m: d,
            feature_id: id,
            nearest_point: projection.inverse(q.x(), q.y()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Geometry, LineString};
    use georisk_core::vector::{Feature, FeatureCollection};

    fn store(lines: Vec<Vec<(f64, f64)>>) -> FeatureStore {
        FeatureStore::new(
            lines
                .into_iter()
                .map(|coords| Feature::new(Geometry::from(LineString::from(coords))))
                .collect::<FeatureCollection>(),
        )
    }

    #[test]
    fn test_resolve_straight_line() {
        let s = store(vec![vec![(0.0, 0.0), (0.0, 1.0)]]);
        let r = resolve(&s, 0.001, 0.5).unwrap();

        assert_eq!(r.feature_id, 0);
        assert_relative_eq!(r.nearest_point.0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.nearest_point.1, 0.5, epsilon = 1e-12);

        let expected = 0.001 * 111_320.0 * 0.5f64.to_radians().cos();
        assert_relative_eq!(r.distance_m, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_point_on_geometry() {
        let s = store(vec![vec![(-49.28, -25.44), (-49.26, -25.42)]]);
        let r = resolve(&s, -49.27, -25.43).unwrap();
        assert_relative_eq!(r.distance_m, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.nearest_point.0, -49.27, epsilon = 1e-9);
        assert_relative_eq!(r.nearest_point.1, -25.43, epsilon = 1e-9);
    }

    #[test]
    fn test_top_k_corrects_anisotropy() {
        // At 60° a degree of longitude is half a degree of latitude in meters.
        // Degree space prefers the line 0.008° north (891 m); the line 0.01°
        // east is only 557 m away.
        let s = store(vec![
            vec![(10.0, 60.008), (10.0001, 60.008)],
            vec![(10.01, 59.9), (10.01, 60.1)],
        ]);

        let approx = resolve(&s, 10.0, 60.0).unwrap();
        assert_eq!(approx.feature_id, 0);

        let refined = resolve_among(&s, 10.0, 60.0, 2).unwrap();
        assert_eq!(refined.feature_id, 1);
        assert!(refined.distance_m < approx.distance_m);
        assert_relative_eq!(refined.distance_m, 556.6, max_relative = 1e-3);
    }

    #[test]
    fn test_empty_store() {
        let s = FeatureStore::new(FeatureCollection::new());
        assert!(matches!(resolve(&s, 0.0, 0.0), Err(Error::EmptyCollection)));
    }

    #[test]
    fn test_resolve_many_keeps_order() {
        let s = store(vec![vec![(0.0, 0.0), (0.0, 1.0)], vec![(5.0, 0.0), (5.0, 1.0)]]);
        let results = resolve_many(&s, &[(4.9, 0.5), (0.1, 0.5), (0.0, 0.5)], 1);
        let ids: Vec<FeatureId> = results.iter().map(|r| r.as_ref().unwrap().feature_id).collect();
        assert_eq!(ids, vec![1, 0, 0]);
        assert_eq!(results[2].as_ref().unwrap().distance_m, 0.0);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let s = store(vec![vec![(-49.3, -25.5), (-49.2, -25.4)]]);
        let a = resolve(&s, -49.25, -25.43).unwrap();
        let b = resolve(&s, -49.25, -25.43).unwrap();
        assert_eq!(a, b);
    }
}
