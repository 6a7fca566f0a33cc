//! Water proximity queries
//!
//! - Nearest water: exact local-metric distance to the nearest water feature
//! - Flood zones: zone polygons within a metric radius

mod nearest;
mod zones;

pub use nearest::{NearestWater, resolve, resolve_among, resolve_many};
pub use zones::{ZoneMatch, polygons_within};
