//! Vector helpers
//!
//! - Buffer: circular polygons around points
//! - Bounding box: axis-aligned envelope
//! - Nearest: planar closest point of a geometry to a point

mod buffer;
mod spatial;

pub use buffer::{BufferParams, buffer_point};
pub use spatial::{BoundingBox, Nearest, bounding_box, nearest_on};
