//! Vector features and GeoJSON loading
//!
//! A collection is an ordered `Vec<Feature>`; a feature's position in it is
//! its identifier for as long as the collection lives.

use crate::error::{Error, Result};
use geo_types::Geometry;
use geojson::GeoJson;
use std::path::Path;

/// Opaque attribute map, passed through from the source document
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Geometry in longitude/latitude degrees
    pub geometry: Geometry<f64>,
    pub properties: Properties,
    /// Optional feature ID from the source
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry and no attributes
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
            id: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get an attribute
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Get a string attribute, `None` if absent or not a string
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// Collection of features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Load a GeoJSON FeatureCollection from disk
    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let collection = parse_geojson(&text, path)?;
        tracing::info!(
            path = %path.display(),
            features = collection.len(),
            "loaded feature collection"
        );
        Ok(collection)
    }

    /// Parse a GeoJSON FeatureCollection from a string
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        parse_geojson(text, Path::new("<string>"))
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

fn parse_geojson(text: &str, source: &Path) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse().map_err(|e| Error::parse(source, e))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => {
            return Err(Error::parse(source, "expected a FeatureCollection, found a Feature"));
        }
        GeoJson::Geometry(_) => {
            return Err(Error::parse(source, "expected a FeatureCollection, found a Geometry"));
        }
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let Some(geometry) = f.geometry else {
                return Err(Error::parse(source, format!("feature {} has no geometry", i)));
            };
            let geometry = Geometry::<f64>::try_from(geometry.value)
                .map_err(|e| Error::parse(source, format!("feature {}: {}", i, e)))?;
            if is_empty_geometry(&geometry) {
                return Err(Error::parse(source, format!("feature {} has an empty geometry", i)));
            }

            let id = f.id.map(|id| match id {
                geojson::feature::Id::String(s) => s,
                geojson::feature::Id::Number(n) => n.to_string(),
            });

            Ok(Feature {
                geometry,
                properties: f.properties.unwrap_or_default(),
                id,
            })
        })
        .collect()
}

fn is_empty_geometry(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(_) | Geometry::Line(_) | Geometry::Rect(_) | Geometry::Triangle(_) => false,
        Geometry::LineString(ls) => ls.0.is_empty(),
        Geometry::Polygon(p) => p.exterior().0.is_empty(),
        Geometry::MultiPoint(mp) => mp.0.is_empty(),
        Geometry::MultiLineString(mls) => mls.0.iter().all(|ls| ls.0.is_empty()),
        Geometry::MultiPolygon(mp) => mp.0.iter().all(|p| p.exterior().0.is_empty()),
        Geometry::GeometryCollection(gc) => gc.0.iter().all(is_empty_geometry),
    }
}
