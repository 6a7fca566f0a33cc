//! Rectangular pixel windows

use super::GeoTransform;

/// A row/column rectangle inside a raster, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelWindow {
    pub row_off: usize,
    pub col_off: usize,
    pub height: usize,
    pub width: usize,
}

impl PixelWindow {
    pub fn new(row_off: usize, col_off: usize, height: usize, width: usize) -> Self {
        Self {
            row_off,
            col_off,
            height,
            width,
        }
    }

    /// Zero-area window
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Row range `[row_off, row_off + height)`
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.row_off..self.row_off + self.height
    }

    /// Column range `[col_off, col_off + width)`
    pub fn cols(&self) -> std::ops::Range<usize> {
        self.col_off..self.col_off + self.width
    }

    /// Window covering the CRS-space box `[min_x, max_x] x [min_y, max_y]`.
    ///
    /// Both corners go through the inverse transform and are floored to pixel
    /// indices; the ranges are ordered regardless of axis direction, widened by
    /// one so the far edge pixel is included, and clamped to
    /// `[0, rows] x [0, cols]`. A box that misses the raster yields an empty
    /// window.
    pub fn covering(
        transform: &GeoTransform,
        rows: usize,
        cols: usize,
        (min_x, min_y): (f64, f64),
        (max_x, max_y): (f64, f64),
    ) -> Self {
        let (c_a, r_a) = transform.geo_to_pixel(min_x, max_y);
        let (c_b, r_b) = transform.geo_to_pixel(max_x, min_y);

        if [c_a, r_a, c_b, r_b].iter().any(|v| !v.is_finite()) {
            return Self::empty();
        }

        let (r0, r1) = ordered(r_a.floor(), r_b.floor());
        let (c0, c1) = ordered(c_a.floor(), c_b.floor());

        let Some((row_off, height)) = clamp_span(r0, r1 + 1.0, rows) else {
            return Self::empty();
        };
        let Some((col_off, width)) = clamp_span(c0, c1 + 1.0, cols) else {
            return Self::empty();
        };

        Self::new(row_off, col_off, height, width)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Clamp the half-open span `[start, end)` to `[0, limit)`.
fn clamp_span(start: f64, end: f64, limit: usize) -> Option<(usize, usize)> {
    let start = start.max(0.0);
    let end = end.min(limit as f64);
    if end <= start {
        return None;
    }
    // Both bounds are integral and inside [0, limit] here
    let s = start as usize;
    let e = end as usize;
    Some((s, e - s))
}
