//! Local observations around a point and the heuristic flood risk score
//!
//! [`observe`] gathers everything the context knows about a location into a
//! [`LocalObservations`] record, which renders as a plain-text fact sheet
//! for downstream consumers.

use crate::context::Context;
use crate::water::ZoneMatch;
use geo::{Geometry, InteriorPoint};
use georisk_core::{Error, Result};
use serde::Serialize;
use std::fmt::{self, Write as _};

/// External elevation lookup.
///
/// Implementations may call remote services; they can fail or have no
/// answer for a location.
pub trait ElevationProvider: Send + Sync {
    /// Ground elevation in meters at `(lon, lat)`
    fn elevation(&self, lon: f64, lat: f64) -> Result<Option<f64>>;
}

/// Provider without elevation data
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElevation;

impl ElevationProvider for NoElevation {
    fn elevation(&self, _lon: f64, _lat: f64) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Outcome of a raster statistic, keeping "no data" apart from "failed"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RasterStat {
    Value(f64),
    /// No valid pixels within the radius
    Empty,
    /// The raster could not be read
    Failed(String),
}

impl RasterStat {
    pub fn from_result(result: Result<f64>) -> Self {
        match result {
            Ok(v) if v.is_nan() => RasterStat::Empty,
            Ok(v) => RasterStat::Value(v),
            Err(e) => RasterStat::Failed(e.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            RasterStat::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for RasterStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterStat::Value(v) => write!(f, "{:.2}", v),
            RasterStat::Empty => write!(f, "no data"),
            RasterStat::Failed(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScore {
    pub score: f64,
    pub level: RiskLevel,
}

/// Distance/drop heuristic:
///
/// | condition | level | score |
/// |---|---|---|
/// | distance < 150 m and drop < 5 m | High | 9.0 |
/// | distance < 300 m or drop < 10 m | Medium | 6.0 |
/// | otherwise | Low | 2.0 |
///
/// An unknown drop never satisfies a drop condition.
pub fn risk_score(distance_m: f64, relative_drop_m: Option<f64>) -> RiskScore {
    let drop_below = |limit: f64| relative_drop_m.is_some_and(|d| d < limit);

    if distance_m < 150.0 && drop_below(5.0) {
        RiskScore {
            score: 9.0,
            level: RiskLevel::High,
        }
    } else if distance_m < 300.0 || drop_below(10.0) {
        RiskScore {
            score: 6.0,
            level: RiskLevel::Medium,
        }
    } else {
        RiskScore {
            score: 2.0,
            level: RiskLevel::Low,
        }
    }
}

/// Everything known about the neighborhood of one point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalObservations {
    pub lon: f64,
    pub lat: f64,
    pub water_name: String,
    pub waterway: String,
    pub water_distance_m: f64,
    /// Closest point on the nearest water feature, `(lon, lat)`
    pub water_point: (f64, f64),
    pub point_elevation_m: Option<f64>,
    pub water_elevation_m: Option<f64>,
    /// Point elevation minus water elevation
    pub relative_drop_m: Option<f64>,
    pub radius_m: f64,
    /// `None` when no HAND raster is configured
    pub mean_hand_m: Option<RasterStat>,
    pub coverage_class: f64,
    /// `None` when no coverage raster is configured
    pub coverage_pct: Option<RasterStat>,
    pub flood_zones: Vec<ZoneMatch>,
    pub risk: RiskScore,
}

impl LocalObservations {
    /// Plain-text fact sheet, one observation per line
    pub fn to_fact_sheet(&self) -> String {
        let mut out = String::new();
        let meters = |v: Option<f64>| v.map_or_else(|| "unknown".to_string(), |v| format!("{:.1} m", v));
        let stat = |s: &Option<RasterStat>| {
            s.as_ref()
                .map_or_else(|| "not configured".to_string(), |s| s.to_string())
        };

        // Writing to a String cannot fail
        let _ = writeln!(out, "Location: lon {:.6}, lat {:.6}", self.lon, self.lat);
        let _ = writeln!(
            out,
            "Nearest water: {} ({}) at {:.1} m, closest point lon {:.6}, lat {:.6}",
            self.water_name, self.waterway, self.water_distance_m, self.water_point.0, self.water_point.1
        );
        let _ = writeln!(out, "Point elevation: {}", meters(self.point_elevation_m));
        let _ = writeln!(out, "Water elevation: {}", meters(self.water_elevation_m));
        let _ = writeln!(out, "Relative drop to water: {}", meters(self.relative_drop_m));
        let _ = writeln!(
            out,
            "Mean HAND within {:.0} m: {}",
            self.radius_m,
            stat(&self.mean_hand_m)
        );
        let _ = writeln!(
            out,
            "Coverage class {} within {:.0} m: {}{}",
            self.coverage_class,
            self.radius_m,
            stat(&self.coverage_pct),
            if self.coverage_pct.as_ref().and_then(RasterStat::value).is_some() { " %" } else { "" }
        );

        if self.flood_zones.is_empty() {
            let _ = writeln!(out, "Historical flood zones within {:.0} m: none", self.radius_m);
        } else {
            let _ = writeln!(
                out,
                "Historical flood zones within {:.0} m: {}",
                self.radius_m,
                self.flood_zones.len()
            );
            for zone in &self.flood_zones {
                let props = serde_json::Value::Object(zone.properties.clone());
                let _ = writeln!(out, "  - zone {} at {:.1} m: {}", zone.feature_id, zone.distance_m, props);
            }
        }

        let _ = writeln!(out, "Heuristic risk: {} ({:.1})", self.risk.level, self.risk.score);
        out
    }
}

/// Collect the local observations at `(lon, lat)`.
///
/// Nearest-water and flood-zone failures are returned as errors. Elevation
/// failures degrade to unknown values and raster failures to
/// [`RasterStat::Failed`]; both are logged.
pub fn observe(
    ctx: &Context,
    elevation: &dyn ElevationProvider,
    lon: f64,
    lat: f64,
) -> Result<LocalObservations> {
    let water = ctx.nearest_water(lon, lat)?;
    let store = ctx.water();
    let (water_lon, water_lat) = water.nearest_point;

    let lookup = |lon: f64, lat: f64| match elevation.elevation(lon, lat) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(lon, lat, error = %e, "elevation lookup failed");
            None
        }
    };
    let point_elevation_m = lookup(lon, lat);
    let water_elevation_m = lookup(water_lon, water_lat);
    let relative_drop_m = point_elevation_m.zip(water_elevation_m).map(|(p, w)| p - w);

    let raster_stat = |name: &str, result: Option<Result<f64>>| {
        result.map(|r| {
            if let Err(e) = &r {
                tracing::warn!(raster = name, error = %e, "raster statistic failed");
            }
            RasterStat::from_result(r)
        })
    };
    let mean_hand_m = raster_stat("hand", ctx.mean_hand(lat, lon));
    let coverage_pct = raster_stat("coverage", ctx.coverage_percentage(lat, lon));

    let flood_zones = ctx.zones_within(lon, lat, None)?;

    Ok(LocalObservations {
        lon,
        lat,
        water_name: store.name(water.feature_id).to_string(),
        waterway: store.waterway(water.feature_id).to_string(),
        water_distance_m: water.distance_m,
        water_point: water.nearest_point,
        point_elevation_m,
        water_elevation_m,
        relative_drop_m,
        radius_m: ctx.config().radius_m,
        mean_hand_m,
        coverage_class: ctx.config().coverage_class,
        coverage_pct,
        flood_zones,
        risk: risk_score(water.distance_m, relative_drop_m),
    })
}

/// Observe at a point guaranteed to lie inside `geometry` (e.g. a parcel
/// polygon)
pub fn observe_geometry(
    ctx: &Context,
    elevation: &dyn ElevationProvider,
    geometry: &Geometry<f64>,
) -> Result<LocalObservations> {
    let point = geometry
        .interior_point()
        .ok_or_else(|| Error::Algorithm("geometry has no interior point".into()))?;
    observe(ctx, elevation, point.x(), point.y())
}
