//! # GeoRisk Core
//!
//! Core types and I/O shared by the GeoRisk crates.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced single-band grid with a no-data sentinel
//! - `GeoTransform` and `PixelWindow`: pixel/CRS conversions and windows
//! - `CRS`: Coordinate Reference System handling
//! - `FeatureCollection`: vector features loaded from GeoJSON
//! - Native GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, PixelWindow, Raster, RasterElement};
pub use vector::{Feature, FeatureCollection, Properties};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, PixelWindow, Raster, RasterElement};
    pub use crate::vector::{Feature, FeatureCollection};
}
