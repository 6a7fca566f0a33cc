//! Raster statistics inside a metric radius around a point
//!
//! The radius is converted to raster CRS units (degrees for geographic
//! rasters, unchanged for projected ones), a pixel window is cut around the
//! circle's bounding box, and an ellipse mask over pixel centers selects the
//! cells. A cell is *valid* when it is inside the ellipse and not no-data;
//! both statistics work on that single valid grid and return NaN when it
//! has no true cell.

use crate::projection::{meters_per_degree, to_raster_crs};
use georisk_core::io::GeoTiffReader;
use georisk_core::raster::{GeoTransform, PixelWindow, Raster, RasterElement};
use georisk_core::{CRS, Error, Result};
use ndarray::{Array2, ArrayView2, Zip};
use std::path::Path;

/// Parameters for neighborhood statistics
#[derive(Debug, Clone)]
pub struct NeighborhoodParams {
    /// Radius around the query point in meters (default: 200)
    pub radius_m: f64,
    /// 1-based band index (default: 1)
    pub band: usize,
}

impl Default for NeighborhoodParams {
    fn default() -> Self {
        Self {
            radius_m: 200.0,
            band: 1,
        }
    }
}

/// Radius in meters expressed as `(rx, ry)` in the raster's CRS units.
///
/// Geographic rasters use the local meters-per-degree at `lat`; projected
/// rasters are assumed metric and get `(radius_m, radius_m)`.
pub fn radius_to_crs_units<T: RasterElement>(
    raster: &Raster<T>,
    lat: f64,
    radius_m: f64,
) -> Result<(f64, f64)> {
    let crs = raster.crs().ok_or(Error::MissingCrs)?;
    Ok(crs_units(crs, lat, radius_m))
}

fn crs_units(crs: &CRS, lat: f64, radius_m: f64) -> (f64, f64) {
    if crs.is_geographic() {
        let (mx, my) = meters_per_degree(lat);
        (radius_m / mx, radius_m / my)
    } else {
        (radius_m, radius_m)
    }
}

/// Pixel window covering `[x - rx, x + rx] × [y - ry, y + ry]`, clamped to
/// the raster. Empty when the box misses the raster.
pub fn window_for_circle<T: RasterElement>(
    raster: &Raster<T>,
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
) -> PixelWindow {
    Circle { x, y, rx, ry }.window(raster.transform(), raster.rows(), raster.cols())
}

/// Boolean grid sized to `window`, true where the pixel center lies inside
/// the ellipse `((x - x0) / rx)² + ((y - y0) / ry)² ≤ 1`.
///
/// Non-positive radii select nothing.
pub fn ellipse_mask<T: RasterElement>(
    raster: &Raster<T>,
    window: &PixelWindow,
    x0: f64,
    y0: f64,
    rx: f64,
    ry: f64,
) -> Array2<bool> {
    Circle {
        x: x0,
        y: y0,
        rx,
        ry,
    }
    .mask(raster.transform(), window)
}

/// Query circle in raster CRS units
#[derive(Debug, Clone, Copy)]
struct Circle {
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
}

impl Circle {
    fn around(crs: &CRS, lat: f64, lon: f64, radius_m: f64) -> Result<Self> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(Error::InvalidParameter {
                name: "radius_m",
                value: radius_m.to_string(),
                reason: "must be a finite, non-negative number of meters".into(),
            });
        }
        let (x, y) = to_raster_crs(crs, lon, lat)?;
        let (rx, ry) = crs_units(crs, lat, radius_m);
        Ok(Self { x, y, rx, ry })
    }

    fn window(&self, transform: &GeoTransform, rows: usize, cols: usize) -> PixelWindow {
        PixelWindow::covering(
            transform,
            rows,
            cols,
            (self.x - self.rx, self.y - self.ry),
            (self.x + self.rx, self.y + self.ry),
        )
    }

    /// Pixel centers are taken from `transform`, the transform of the full
    /// raster the window indexes into.
    fn mask(&self, transform: &GeoTransform, window: &PixelWindow) -> Array2<bool> {
        let degenerate = !(self.rx > 0.0 && self.ry > 0.0);

        Array2::from_shape_fn((window.height, window.width), |(r, c)| {
            if degenerate {
                return false;
            }
            let (x, y) = transform.pixel_to_geo(window.col_off + c, window.row_off + r);
            let dx = (x - self.x) / self.rx;
            let dy = (y - self.y) / self.ry;
            dx * dx + dy * dy <= 1.0
        })
    }
}

/// Values of the cells that are inside the mask and not no-data, as f64
fn valid_values<T: RasterElement>(
    cells: ArrayView2<'_, T>,
    mask: &Array2<bool>,
    is_nodata: impl Fn(T) -> bool,
) -> Vec<f64> {
    let valid = Zip::from(mask)
        .and(&cells)
        .map_collect(|&inside, &v| inside && !is_nodata(v));

    let mut values = Vec::with_capacity(valid.len());
    Zip::from(&valid).and(&cells).for_each(|&ok, &v| {
        if ok && let Some(v) = v.to_f64() {
            values.push(v);
        }
    });
    values
}

fn raster_values<T: RasterElement>(
    raster: &Raster<T>,
    lat: f64,
    lon: f64,
    radius_m: f64,
) -> Result<Vec<f64>> {
    let crs = raster.crs().ok_or(Error::MissingCrs)?;
    let circle = Circle::around(crs, lat, lon, radius_m)?;
    let window = circle.window(raster.transform(), raster.rows(), raster.cols());
    let mask = circle.mask(raster.transform(), &window);

    tracing::debug!(
        lat,
        lon,
        radius_m,
        rows = window.height,
        cols = window.width,
        "neighborhood window"
    );

    let cells = raster.window_view(&window)?;
    Ok(valid_values(cells, &mask, |v| raster.is_nodata(v)))
}

/// Same as [`raster_values`] for a file, decoding only the window
fn file_values<P: AsRef<Path>>(
    path: P,
    lat: f64,
    lon: f64,
    radius_m: f64,
    band: usize,
) -> Result<Vec<f64>> {
    let mut reader = GeoTiffReader::open(path)?;

    let info = reader.info();
    let crs = info.crs.as_ref().ok_or(Error::MissingCrs)?;
    let circle = Circle::around(crs, lat, lon, radius_m)?;
    let window = circle.window(&info.transform, info.height, info.width);
    let mask = circle.mask(&info.transform, &window);

    tracing::debug!(
        lat,
        lon,
        radius_m,
        band,
        row_off = window.row_off,
        col_off = window.col_off,
        rows = window.height,
        cols = window.width,
        "neighborhood window"
    );

    let cells: Raster<f64> = reader.read_window(band, &window)?;
    Ok(valid_values(cells.data().view(), &mask, |v| cells.is_nodata(v)))
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn percentage_of(values: &[f64], target_value: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let equal = values.iter().filter(|&&v| v == target_value).count();
    100.0 * equal as f64 / values.len() as f64
}

/// Mean of the valid cells of `raster` within `radius_m` of `(lat, lon)`,
/// NaN when there are none.
pub fn raster_mean_within_radius<T: RasterElement>(
    raster: &Raster<T>,
    lat: f64,
    lon: f64,
    radius_m: f64,
) -> Result<f64> {
    raster_values(raster, lat, lon, radius_m).map(|v| mean_of(&v))
}

/// Percentage (0-100) of the valid cells equal to `target_value`, NaN when
/// there are no valid cells.
pub fn raster_percentage_equal_within_radius<T: RasterElement>(
    raster: &Raster<T>,
    lat: f64,
    lon: f64,
    radius_m: f64,
    target_value: f64,
) -> Result<f64> {
    raster_values(raster, lat, lon, radius_m).map(|v| percentage_of(&v, target_value))
}

/// Mean of band `band` (1-based) of the GeoTIFF at `path` within `radius_m`
/// of `(lat, lon)`.
///
/// The file is opened and released within this call and only the strips or
/// tiles under the circle's window are decoded. Read failures come back as
/// `Error::RasterIo`, never as NaN.
pub fn mean_within_radius<P: AsRef<Path>>(
    path: P,
    lat: f64,
    lon: f64,
    radius_m: f64,
    band: usize,
) -> Result<f64> {
    file_values(path, lat, lon, radius_m, band).map(|v| mean_of(&v))
}

/// Percentage of band `band` cells equal to `target_value` within
/// `radius_m` of `(lat, lon)`.
pub fn percentage_equal_within_radius<P: AsRef<Path>>(
    path: P,
    lat: f64,
    lon: f64,
    radius_m: f64,
    target_value: f64,
    band: usize,
) -> Result<f64> {
    file_values(path, lat, lon, radius_m, band).map(|v| percentage_of(&v, target_value))
}
