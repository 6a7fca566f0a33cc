//! WGS84 (lon, lat) to raster CRS coordinates.
//!
//! Geographic rasters take the point unchanged. EPSG 326xx/327xx (UTM) use the
//! Snyder 1987 USGS formulas and EPSG 3857 the spherical Web Mercator
//! equations. Any other CRS goes through `proj4rs`, using the CRS's own PROJ
//! string or the `crs-definitions` entry for its EPSG code; a CRS with
//! neither is rejected with `UnsupportedCrs`.

use georisk_core::{CRS, Error, Result};
use proj4rs::proj::Proj;
use std::f64::consts::FRAC_PI_4;

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Web Mercator latitude limit (degrees)
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Project a WGS84 point into the coordinate space of `crs`.
pub fn to_raster_crs(crs: &CRS, lon: f64, lat: f64) -> Result<(f64, f64)> {
    if crs.is_geographic() {
        return Ok((lon, lat));
    }

    match crs.epsg() {
        Some(3857 | 900913) => Ok(wgs84_to_web_mercator(lon, lat)),
        Some(code) => match parse_utm_epsg(code) {
            Some((zone, north)) => Ok(wgs84_to_utm(lon, lat, zone, north)),
            None => wgs84_to_proj(crs, lon, lat),
        },
        None => wgs84_to_proj(crs, lon, lat),
    }
}

/// PROJ definition for `crs`: its own PROJ string, else the EPSG database entry
fn proj_definition(crs: &CRS) -> Option<&str> {
    crs.proj().or_else(|| {
        crs.epsg()
            .and_then(|code| u16::try_from(code).ok())
            .and_then(crs_definitions::from_code)
            .map(|def| def.proj4)
    })
}

fn wgs84_to_proj(crs: &CRS, lon: f64, lat: f64) -> Result<(f64, f64)> {
    let definition = proj_definition(crs).ok_or_else(|| Error::UnsupportedCrs(crs.identifier()))?;

    let source = Proj::from_proj_string(WGS84_PROJ)
        .map_err(|e| Error::Algorithm(format!("invalid WGS84 definition: {e:?}")))?;
    let target = Proj::from_proj_string(definition)
        .map_err(|e| Error::UnsupportedCrs(format!("{} ({e:?})", crs.identifier())))?;

    // proj4rs takes geographic coordinates in radians
    let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
    proj4rs::transform::transform(&source, &target, &mut point).map_err(|e| {
        Error::Algorithm(format!("transform to {} failed: {e:?}", crs.identifier()))
    })?;

    Ok((point.0, point.1))
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

fn wgs84_to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = A * lon.to_radians();
    let y = A * (FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

// ── Transverse Mercator (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64) ──

/// WGS84 (longitude, latitude) in degrees to UTM (easting, northing) in
/// metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    if north {
        (easting, northing)
    } else {
        (easting, northing + FALSE_NORTHING_SOUTH)
    }
}

/// Meridional arc from the equator to `lat` (radians), Snyder eq. 3-21
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
