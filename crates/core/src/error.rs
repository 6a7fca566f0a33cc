//! Error types for GeoRisk

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GeoRisk operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed vector or raster input at load time
    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Raster open/read failure. Kept apart from `Io` so callers can tell
    /// "the raster is broken" from "the raster has no data here".
    #[error("raster I/O error on {path}: {reason}")]
    RasterIo { path: PathBuf, reason: String },

    #[error("raster has no coordinate reference system")]
    MissingCrs,

    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// An index candidate could not be mapped back to a feature
    #[error("spatial index returned candidate {id} but the collection has {len} features")]
    IndexResolution { id: usize, len: usize },

    #[error("feature collection is empty")]
    EmptyCollection,

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("band {band} does not exist (raster has {bands} band(s), indices are 1-based)")]
    InvalidBand { band: usize, bands: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn raster_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::RasterIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from reading a raster file
    pub fn is_raster_io(&self) -> bool {
        matches!(self, Error::RasterIo { .. })
    }
}

/// Result type alias for GeoRisk operations
pub type Result<T> = std::result::Result<T, Error>;
