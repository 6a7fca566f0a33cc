//! GeoRisk CLI - nearest water, flood zones and raster neighborhoods

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use georisk_algorithms::context::{Context, ContextConfig};
use georisk_algorithms::observations::{NoElevation, observe};
use georisk_algorithms::statistics::{
    NeighborhoodParams, mean_within_radius, percentage_equal_within_radius,
};
use georisk_core::io::{read_geotiff, read_geotiff_info};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "georisk")]
#[command(author, version, about = "Flood-risk context for a location", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON file with context settings; flags below override it
    #[arg(short, long, global = true, env = "GEORISK_CONFIG")]
    config: Option<PathBuf>,

    /// Water features (GeoJSON)
    #[arg(long, global = true, env = "GEORISK_WATER")]
    water: Option<PathBuf>,

    /// Historical flood-zone polygons (GeoJSON)
    #[arg(long, global = true, env = "GEORISK_FLOOD_ZONES")]
    flood_zones: Option<PathBuf>,

    /// Height-above-nearest-drainage raster (GeoTIFF)
    #[arg(long, global = true, env = "GEORISK_HAND_RASTER")]
    hand_raster: Option<PathBuf>,

    /// Land-coverage class raster (GeoTIFF)
    #[arg(long, global = true, env = "GEORISK_COVERAGE_RASTER")]
    coverage_raster: Option<PathBuf>,

    /// Coverage class counted by the coverage percentage
    #[arg(long, global = true, env = "GEORISK_COVERAGE_CLASS")]
    coverage_class: Option<f64>,

    /// Neighborhood radius in meters
    #[arg(long, global = true, env = "GEORISK_RADIUS_M")]
    radius_m: Option<f64>,

    /// Degree-space candidates refined per nearest-water query
    #[arg(long, global = true, env = "GEORISK_NEAREST_CANDIDATES")]
    candidates: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Distance to the nearest water feature
    #[command(allow_negative_numbers = true)]
    Distance {
        /// Longitude (degrees)
        lon: f64,
        /// Latitude (degrees)
        lat: f64,
    },
    /// Historical flood zones within a radius
    #[command(allow_negative_numbers = true)]
    Zones {
        /// Longitude (degrees)
        lon: f64,
        /// Latitude (degrees)
        lat: f64,
    },
    /// Mean (or class percentage) of a raster band around a point
    #[command(allow_negative_numbers = true)]
    Stats {
        /// Input raster file
        raster: PathBuf,
        /// Longitude (degrees)
        lon: f64,
        /// Latitude (degrees)
        lat: f64,
        /// 1-based band index
        #[arg(short, long, default_value = "1")]
        band: usize,
        /// Report the percentage of pixels equal to this value instead of the mean
        #[arg(short, long)]
        equals: Option<f64>,
    },
    /// All local observations and the heuristic risk score
    #[command(allow_negative_numbers = true)]
    Observe {
        /// Longitude (degrees)
        lon: f64,
        /// Latitude (degrees)
        lat: f64,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Config file (if any) with command-line overrides applied
fn merged_config(cli: &Cli) -> Result<ContextConfig> {
    let mut config = match &cli.config {
        Some(path) => ContextConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ContextConfig::default(),
    };

    if let Some(water) = &cli.water {
        config.water = water.clone();
    }
    if cli.flood_zones.is_some() {
        config.flood_zones = cli.flood_zones.clone();
    }
    if cli.hand_raster.is_some() {
        config.hand_raster = cli.hand_raster.clone();
    }
    if cli.coverage_raster.is_some() {
        config.coverage_raster = cli.coverage_raster.clone();
    }
    if let Some(class) = cli.coverage_class {
        config.coverage_class = class;
    }
    if let Some(radius) = cli.radius_m {
        config.radius_m = radius;
    }
    if let Some(k) = cli.candidates {
        config.nearest_candidates = k;
    }
    Ok(config)
}

/// Merged config for commands that query the feature stores
fn context_config(cli: &Cli) -> Result<ContextConfig> {
    let config = merged_config(cli)?;
    if config.water.as_os_str().is_empty() {
        anyhow::bail!("No water features given. Use --water, GEORISK_WATER or a config file.");
    }
    Ok(config)
}

fn load_context(cli: &Cli) -> Result<Context> {
    let config = context_config(cli)?;
    let pb = spinner("Loading features...");
    let ctx = Context::initialize(&config).context("Failed to initialize context");
    pb.finish_and_clear();
    ctx
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn raster_info(input: &Path, as_json: bool) -> Result<()> {
    let meta = read_geotiff_info(input).context("Failed to read raster metadata")?;
    let pb = spinner("Reading raster...");
    let raster = read_geotiff::<f64, _>(input, None).context("Failed to read raster");
    pb.finish_and_clear();
    let raster = raster?;

    let bounds = raster.bounds();
    let stats = raster.statistics();
    let crs = meta.crs.as_ref().map(|c| c.to_string());

    if as_json {
        return print_json(&json!({
            "file": input.display().to_string(),
            "width": meta.width,
            "height": meta.height,
            "bands": meta.bands,
            "cell_size": meta.transform.cell_size(),
            "bounds": [bounds.0, bounds.1, bounds.2, bounds.3],
            "crs": crs,
            "nodata": meta.nodata,
            "band1": {
                "min": stats.min,
                "max": stats.max,
                "mean": stats.mean,
                "valid_cells": stats.valid_count,
            },
        }));
    }

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} band(s))", meta.width, meta.height, meta.bands);
    println!("Cell size: {}", meta.transform.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    println!("CRS: {}", crs.as_deref().unwrap_or("none"));
    if let Some(nodata) = meta.nodata {
        println!("NoData: {}", nodata);
    }
    println!("\nBand 1 statistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match &cli.command {
        Commands::Distance { lon, lat } => {
            let ctx = load_context(&cli)?;
            let start = Instant::now();
            let water = ctx
                .nearest_water(*lon, *lat)
                .context("Nearest water lookup failed")?;
            info!("Resolved in {:.2?}", start.elapsed());

            let store = ctx.water();
            let name = store.name(water.feature_id);
            let waterway = store.waterway(water.feature_id);

            if cli.json {
                print_json(&json!({
                    "distance_m": water.distance_m,
                    "feature_id": water.feature_id,
                    "name": name,
                    "waterway": waterway,
                    "nearest_point": [water.nearest_point.0, water.nearest_point.1],
                }))?;
            } else {
                println!("Nearest water: {} ({})", name, waterway);
                println!("  Distance: {:.1} m", water.distance_m);
                println!(
                    "  Closest point: {:.6}, {:.6}",
                    water.nearest_point.0, water.nearest_point.1
                );
            }
        }

        Commands::Zones { lon, lat } => {
            let ctx = load_context(&cli)?;
            let radius = ctx.config().radius_m;
            let zones = ctx
                .zones_within(*lon, *lat, None)
                .context("Flood zone query failed")?;

            if cli.json {
                print_json(&serde_json::to_value(&zones)?)?;
            } else if zones.is_empty() {
                println!("No flood zones within {:.0} m", radius);
            } else {
                println!("{} flood zone(s) within {:.0} m:", zones.len(), radius);
                for zone in &zones {
                    println!(
                        "  #{} at {:.1} m: {}",
                        zone.feature_id,
                        zone.distance_m,
                        serde_json::Value::Object(zone.properties.clone())
                    );
                }
            }
        }

        Commands::Stats {
            raster,
            lon,
            lat,
            band,
            equals,
        } => {
            let params = NeighborhoodParams {
                radius_m: merged_config(&cli)?.radius_m,
                band: *band,
            };

            let pb = spinner("Reading raster...");
            let start = Instant::now();
            let value = match equals {
                Some(target) => percentage_equal_within_radius(
                    raster,
                    *lat,
                    *lon,
                    params.radius_m,
                    *target,
                    params.band,
                ),
                None => mean_within_radius(raster, *lat, *lon, params.radius_m, params.band),
            };
            pb.finish_and_clear();
            let value = value.context("Raster statistic failed")?;
            info!("Computed in {:.2?}", start.elapsed());

            let statistic = if equals.is_some() { "percentage_equal" } else { "mean" };
            if cli.json {
                print_json(&json!({
                    "statistic": statistic,
                    "radius_m": params.radius_m,
                    "band": params.band,
                    "target": equals,
                    "value": if value.is_nan() { None } else { Some(value) },
                }))?;
            } else if value.is_nan() {
                println!("No valid pixels within {:.0} m", params.radius_m);
            } else if let Some(target) = equals {
                println!(
                    "{:.2}% of pixels equal {} within {:.0} m",
                    value, target, params.radius_m
                );
            } else {
                println!("Mean within {:.0} m: {:.4}", params.radius_m, value);
            }
        }

        Commands::Observe { lon, lat } => {
            let ctx = load_context(&cli)?;
            let pb = spinner("Collecting observations...");
            let obs = observe(&ctx, &NoElevation, *lon, *lat);
            pb.finish_and_clear();
            let obs = obs.context("Observation failed")?;

            if cli.json {
                print_json(&serde_json::to_value(&obs)?)?;
            } else {
                print!("{}", obs.to_fact_sheet());
            }
        }

        Commands::Info { input } => raster_info(input, cli.json)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_core::io::write_geotiff;
    use georisk_core::{CRS, GeoTransform, Raster};
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("georisk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_stats_radius_follows_config_then_flag() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("georisk.json");
        std::fs::write(&config, r#"{"radius_m": 350}"#).unwrap();
        let config = config.to_str().unwrap();

        let cli = parse(&["--config", config, "stats", "hand.tif", "-49.27", "-25.43"]);
        assert_eq!(merged_config(&cli).unwrap().radius_m, 350.0);

        let cli = parse(&["--config", config, "--radius-m", "120", "stats", "hand.tif", "0", "0"]);
        assert_eq!(merged_config(&cli).unwrap().radius_m, 120.0);

        let cli = parse(&["stats", "hand.tif", "0", "0"]);
        assert_eq!(
            merged_config(&cli).unwrap().radius_m,
            NeighborhoodParams::default().radius_m
        );
    }

    #[test]
    fn test_store_commands_need_water() {
        let cli = parse(&["distance", "0", "0"]);
        assert!(merged_config(&cli).is_ok());
        assert!(context_config(&cli).is_err());
    }

    #[test]
    fn test_info_reads_raster() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dem.tif");
        let raster = Raster::filled(4, 4, 2.0f64)
            .with_transform(GeoTransform::new(-49.3, -25.4, 0.001, -0.001))
            .with_crs(CRS::wgs84());
        write_geotiff(&raster, &path).unwrap();

        assert!(raster_info(&path, true).is_ok());
        assert!(raster_info(&dir.path().join("missing.tif"), false).is_err());
    }
}
