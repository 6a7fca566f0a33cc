//! Process-wide query context
//!
//! Built once at startup with [`Context::initialize`] and shared read-only
//! (by reference or `Arc`) with every query afterwards.

use crate::statistics::{mean_within_radius, percentage_equal_within_radius};
use crate::store::FeatureStore;
use crate::water::{NearestWater, ZoneMatch, polygons_within, resolve_among};
use georisk_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inputs and defaults for a [`Context`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Water features (GeoJSON), required
    pub water: PathBuf,
    /// Historical flood-zone polygons (GeoJSON)
    pub flood_zones: Option<PathBuf>,
    /// Height-above-nearest-drainage raster (GeoTIFF)
    pub hand_raster: Option<PathBuf>,
    /// Land-coverage class raster (GeoTIFF)
    pub coverage_raster: Option<PathBuf>,
    /// Coverage class counted by the coverage percentage (default: 24)
    pub coverage_class: f64,
    /// Neighborhood radius in meters (default: 200)
    pub radius_m: f64,
    pub hand_band: usize,
    pub coverage_band: usize,
    /// Degree-space candidates refined per nearest-water query (default: 1)
    pub nearest_candidates: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            water: PathBuf::new(),
            flood_zones: None,
            hand_raster: None,
            coverage_raster: None,
            coverage_class: 24.0,
            radius_m: 200.0,
            hand_band: 1,
            coverage_band: 1,
            nearest_candidates: 1,
        }
    }
}

impl ContextConfig {
    pub fn new(water: impl Into<PathBuf>) -> Self {
        Self {
            water: water.into(),
            ..Default::default()
        }
    }

    /// Read a JSON config file; absent fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Loaded feature stores plus the raster locations
#[derive(Debug)]
pub struct Context {
    config: ContextConfig,
    water: FeatureStore,
    flood_zones: Option<FeatureStore>,
}

impl Context {
    /// Load and index the configured collections.
    ///
    /// The water collection is required: any load failure is returned. A
    /// flood-zone collection that fails to load is logged and left out, so
    /// zone queries return no matches.
    pub fn initialize(config: &ContextConfig) -> Result<Self> {
        let water = FeatureStore::from_geojson_file(&config.water)?;
        if water.is_empty() {
            return Err(Error::EmptyCollection);
        }

        let flood_zones = match &config.flood_zones {
            None => None,
            Some(path) => match FeatureStore::from_geojson_file(path) {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "flood zone collection unavailable, zone queries will return no matches"
                    );
                    None
                }
            },
        };

        tracing::info!(
            water = water.len(),
            flood_zones = ?flood_zones.as_ref().map(FeatureStore::len),
            "context initialized"
        );

        Ok(Self {
            config: config.clone(),
            water,
            flood_zones,
        })
    }

    /// Build a context from stores already in memory
    pub fn from_stores(config: ContextConfig, water: FeatureStore, flood_zones: Option<FeatureStore>) -> Self {
        Self {
            config,
            water,
            flood_zones,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn water(&self) -> &FeatureStore {
        &self.water
    }

    pub fn flood_zones(&self) -> Option<&FeatureStore> {
        self.flood_zones.as_ref()
    }

    /// Nearest water using the configured number of candidates
    pub fn nearest_water(&self, lon: f64, lat: f64) -> Result<NearestWater> {
        resolve_among(&self.water, lon, lat, self.config.nearest_candidates)
    }

    /// Flood zones within `radius_m`, or the configured radius
    pub fn zones_within(&self, lon: f64, lat: f64, radius_m: Option<f64>) -> Result<Vec<ZoneMatch>> {
        polygons_within(
            self.flood_zones.as_ref(),
            lon,
            lat,
            radius_m.unwrap_or(self.config.radius_m),
        )
    }

    /// Mean HAND within the configured radius; `None` without a HAND raster
    pub fn mean_hand(&self, lat: f64, lon: f64) -> Option<Result<f64>> {
        self.config.hand_raster.as_ref().map(|path| {
            mean_within_radius(path, lat, lon, self.config.radius_m, self.config.hand_band)
        })
    }

    /// Percentage of the configured coverage class within the configured
    /// radius; `None` without a coverage raster
    pub fn coverage_percentage(&self, lat: f64, lon: f64) -> Option<Result<f64>> {
        self.config.coverage_raster.as_ref().map(|path| {
            percentage_equal_within_radius(
                path,
                lat,
                lon,
                self.config.radius_m,
                self.config.coverage_class,
                self.config.coverage_band,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WATER: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "Rio Test", "waterway": "stream"},
         "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 1.0]]}}
    ]}"#;

    fn write_temp(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let file = write_temp(r#"{"water": "rivers.geojson", "radius_m": 350}"#);
        let config = ContextConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.water, PathBuf::from("rivers.geojson"));
        assert_eq!(config.radius_m, 350.0);
        assert_eq!(config.coverage_class, 24.0);
        assert_eq!(config.hand_band, 1);
        assert_eq!(config.nearest_candidates, 1);
    }

    #[test]
    fn test_config_bad_json() {
        let file = write_temp("{ water: ");
        assert!(matches!(
            ContextConfig::from_json_file(file.path()),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_initialize_with_broken_flood_zones() {
        let water = write_temp(WATER);
        let zones = write_temp("not geojson");
        let config = ContextConfig {
            flood_zones: Some(zones.path().to_path_buf()),
            ..ContextConfig::new(water.path())
        };

        let ctx = Context::initialize(&config).unwrap();
        assert_eq!(ctx.water().len(), 1);
        assert!(ctx.flood_zones().is_none());
        assert!(ctx.zones_within(0.0, 0.5, None).unwrap().is_empty());
        assert!(ctx.mean_hand(0.5, 0.0).is_none());
    }

    #[test]
    fn test_initialize_requires_water() {
        let broken = write_temp("{}");
        assert!(Context::initialize(&ContextConfig::new(broken.path())).is_err());

        let empty = write_temp(r#"{"type": "FeatureCollection", "features": []}"#);
        assert!(matches!(
            Context::initialize(&ContextConfig::new(empty.path())),
            Err(Error::EmptyCollection)
        ));
    }

    #[test]
    fn test_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Context>();
    }
}
