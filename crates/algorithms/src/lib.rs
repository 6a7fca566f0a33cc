//! # GeoRisk Algorithms
//!
//! Proximity and neighborhood queries for flood-risk context.
//!
//! ## Modules
//!
//! - **projection**: local equirectangular projection, WGS84 to raster CRS
//! - **store**: feature collections indexed with an R-tree
//! - **water**: nearest-water resolution and flood-zone radius queries
//! - **statistics**: raster mean / categorical percentage within a radius
//! - **context**: process-wide, read-only query context
//! - **observations**: local fact sheet and heuristic risk score

pub mod context;
pub(crate) mod maybe_rayon;
pub mod observations;
pub mod projection;
pub mod statistics;
pub mod store;
pub mod vector;
pub mod water;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::context::{Context, ContextConfig};
    pub use crate::observations::{
        ElevationProvider, LocalObservations, NoElevation, RasterStat, RiskLevel, RiskScore,
        observe, observe_geometry, risk_score,
    };
    pub use crate::projection::{LocalProjection, make_projection, meters_per_degree};
    pub use crate::statistics::{
        NeighborhoodParams, mean_within_radius, percentage_equal_within_radius,
    };
    pub use crate::store::{FeatureId, FeatureStore};
    pub use crate::water::{
        NearestWater, ZoneMatch, polygons_within, resolve, resolve_among, resolve_many,
    };
    pub use georisk_core::prelude::*;
}
