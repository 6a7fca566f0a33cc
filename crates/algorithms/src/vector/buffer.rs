//! Circular buffers around points

use geo::{LineString, Point, Polygon};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer radius, in the units of the input point
    pub distance: f64,
    /// Number of segments approximating the circle (default: 32).
    /// Multiples of 4 put a vertex on each axis extreme, so the polygon's
    /// bounding box matches the circle's.
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 32,
        }
    }
}

/// Create a circular buffer around a point.
///
/// Generates a closed polygon inscribed in the circle of radius
/// `params.distance`.
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let n = params.segments.max(4);
    let r = params.distance.abs();
    let cx = point.x();
    let cy = point.y();

    let mut coords: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect();
    // Close the ring
    coords.push((cx + r, cy));

    Polygon::new(LineString::from(coords), vec![])
}
