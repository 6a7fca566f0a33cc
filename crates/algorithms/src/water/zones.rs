//! Flood-zone polygons within a metric radius of a point

use crate::projection::LocalProjection;
use crate::store::{FeatureId, FeatureStore};
use crate::vector::{BoundingBox, BufferParams, bounding_box, buffer_point, nearest_on};
use geo::{Geometry, Point};
use georisk_core::vector::Properties;
use georisk_core::{Error, Result};
use serde::Serialize;

/// A flood-zone feature within the query radius
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneMatch {
    pub feature_id: FeatureId,
    pub properties: Properties,
    /// Metric distance from the query point, 0 when inside the zone
    pub distance_m: f64,
    #[serde(skip)]
    pub geometry: Geometry<f64>,
}

/// All features of `zones` within `radius_m` meters of `(lon, lat)`, in
/// ascending feature id order.
///
/// A missing collection yields no matches rather than an error.
pub fn polygons_within(
    zones: Option<&FeatureStore>,
    lon: f64,
    lat: f64,
    radius_m: f64,
) -> Result<Vec<ZoneMatch>> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(Error::InvalidParameter {
            name: "radius_m",
            value: radius_m.to_string(),
            reason: "must be a finite, non-negative number of meters".into(),
        });
    }

    let Some(store) = zones else {
        return Ok(Vec::new());
    };

    let projection = LocalProjection::new(lon, lat);
    let search = search_box(&projection, radius_m)?;
    let candidates = store.query_bbox(&search);

    let mut matches = Vec::new();
    for id in &candidates {
        let feature = store.feature(*id)?;
        let local = projection.project(&feature.geometry);
        let Some(nearest) = nearest_on(&local, Point::new(0.0, 0.0)) else {
            continue;
        };
        let distance_m = nearest.distance();
        if distance_m <= radius_m {
            matches.push(ZoneMatch {
                feature_id: *id,
                properties: feature.properties.clone(),
                distance_m,
                geometry: feature.geometry.clone(),
            });
        }
    }

    tracing::debug!(
        lon,
        lat,
        radius_m,
        candidates = candidates.len(),
        matches = matches.len(),
        "flood zone query"
    );

    Ok(matches)
}

/// Degree-space bounding box of the metric circle around the projection
/// origin
fn search_box(projection: &LocalProjection, radius_m: f64) -> Result<BoundingBox> {
    let circle = buffer_point(
        &Point::new(0.0, 0.0),
        &BufferParams {
            distance: radius_m,
            ..Default::default()
        },
    );
    let local = bounding_box(&Geometry::Polygon(circle))
        .ok_or_else(|| Error::Algorithm("empty search circle".into()))?;

    Ok(BoundingBox::from_corners(
        projection.inverse(local.min_x, local.min_y),
        projection.inverse(local.max_x, local.max_y),
    ))
}
