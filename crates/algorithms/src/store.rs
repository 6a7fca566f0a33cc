//! Feature store: an immutable feature collection plus its R-tree.
//!
//! The tree holds each feature's envelope tagged with the feature's position
//! in the collection, so every index hit resolves to a feature in O(1).

use crate::vector::{BoundingBox, bounding_box, nearest_on};
use geo::Point;
use georisk_core::vector::{Feature, FeatureCollection};
use georisk_core::{Error, Result};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use std::path::Path;

/// Position of a feature in its collection
pub type FeatureId = usize;

type IndexEntry = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

/// Fallback for absent `name`/`waterway` attributes
pub const UNKNOWN: &str = "unknown";

/// Read-only feature collection with an envelope R-tree in degree space
#[derive(Debug)]
pub struct FeatureStore {
    collection: FeatureCollection,
    tree: RTree<IndexEntry>,
}

impl FeatureStore {
    /// Index `collection`. Bulk loading makes the tree identical for
    /// identical input.
    pub fn new(collection: FeatureCollection) -> Self {
        let entries: Vec<IndexEntry> = collection
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| {
                let Some(bb) = bounding_box(&feature.geometry) else {
                    tracing::warn!(feature = id, "feature has no extent, not indexed");
                    return None;
                };
                let rect = Rectangle::from_corners([bb.min_x, bb.min_y], [bb.max_x, bb.max_y]);
                Some(GeomWithData::new(rect, id))
            })
            .collect();

        tracing::debug!(
            features = collection.len(),
            indexed = entries.len(),
            "built spatial index"
        );

        Self {
            collection,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Load a GeoJSON FeatureCollection and index it
    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        FeatureCollection::from_geojson_file(path).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Feature by identifier.
    ///
    /// An identifier that does not resolve means the index and the
    /// collection disagree, reported as `IndexResolution`.
    pub fn feature(&self, id: FeatureId) -> Result<&Feature> {
        self.collection.get(id).ok_or(Error::IndexResolution {
            id,
            len: self.collection.len(),
        })
    }

    /// `name` attribute, or "unknown"
    pub fn name(&self, id: FeatureId) -> &str {
        self.str_attribute(id, "name")
    }

    /// `waterway` attribute, or "unknown"
    pub fn waterway(&self, id: FeatureId) -> &str {
        self.str_attribute(id, "waterway")
    }

    fn str_attribute(&self, id: FeatureId, key: &str) -> &str {
        self.collection
            .get(id)
            .and_then(|f| f.str_property(key))
            .unwrap_or(UNKNOWN)
    }

    /// Nearest feature to `(lon, lat)` in degree space.
    ///
    /// Degrees are not meters: away from the equator this is only an
    /// approximation of the metrically nearest feature.
    pub fn nearest(&self, lon: f64, lat: f64) -> Result<Option<FeatureId>> {
        Ok(self.nearest_k(lon, lat, 1)?.into_iter().next())
    }

    /// Up to `k` features nearest to `(lon, lat)` in degree space, closest
    /// first, ties broken by lower identifier.
    ///
    /// Envelopes are visited in order of envelope distance; the search stops
    /// once the next envelope is farther than the k-th exact distance found.
    /// An index hit that does not resolve to a feature is an
    /// `IndexResolution` error.
    pub fn nearest_k(&self, lon: f64, lat: f64, k: usize) -> Result<Vec<FeatureId>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = Point::new(lon, lat);
        let mut best: Vec<(f64, FeatureId)> = Vec::with_capacity(k + 1);

        for (entry, envelope_d2) in self.tree.nearest_neighbor_iter_with_distance_2(&[lon, lat]) {
            if best.len() == k && best.last().is_some_and(|&(d2, _)| envelope_d2 > d2) {
                break;
            }

            let id = entry.data;
            let Some(nearest) = nearest_on(&self.feature(id)?.geometry, query) else {
                continue;
            };
            let d = nearest.distance();
            let candidate = (d * d, id);

            let pos = best.partition_point(|&(d2, i)| (d2, i) < candidate);
            if pos < k {
                best.insert(pos, candidate);
                best.truncate(k);
            }
        }

        Ok(best.into_iter().map(|(_, id)| id).collect())
    }

    /// Features whose envelope intersects `bbox`, in ascending id order.
    ///
    /// Over-inclusive: callers must apply their own exact filter.
    pub fn query_bbox(&self, bbox: &BoundingBox) -> Vec<FeatureId> {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut ids: Vec<FeatureId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }
}
