//! vfr-plan - build a VFR altitude/terrain/weather profile for a route file

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vfr_core::Route;
use vfr_planner::cache::ElevationCache;
use vfr_planner::providers::{OpenMeteoElevation, OpenMeteoWeather};
use vfr_planner::{Config, PlanRequest, Planner};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Route file: {"name": ..., "waypoints": [{"id", "lat", "lon", ...}]}
    route: PathBuf,

    /// True airspeed in knots
    #[arg(long)]
    tas: Option<f64>,

    /// Cruise altitude (ft MSL) for waypoints without one
    #[arg(long)]
    altitude: Option<f64>,

    /// Departure time, RFC 3339. Defaults to now
    #[arg(long)]
    departure: Option<DateTime<Utc>>,

    /// Terrain sampling interval in nautical miles
    #[arg(long)]
    interval: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("vfr_planner=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let raw = std::fs::read_to_string(&args.route)
        .with_context(|| format!("reading route file {}", args.route.display()))?;
    let route: Route = serde_json::from_str(&raw).context("parsing route file")?;
    tracing::info!(
        "Loaded route {} with {} waypoints",
        route.name.as_deref().unwrap_or("(unnamed)"),
        route.waypoints.len()
    );

    let client = reqwest::Client::new();
    let cache = Arc::new(ElevationCache::new(
        Duration::from_secs(config.elevation_cache_ttl_s),
        config.elevation_cache_max_entries,
    ));
    let planner = Planner::new(
        OpenMeteoWeather::new(client.clone(), &config),
        OpenMeteoElevation::new(client, &config, cache),
    );

    let request = PlanRequest {
        route,
        tas_kt: args.tas.unwrap_or(config.default_tas_kt),
        default_altitude_ft: args.altitude.unwrap_or(config.default_altitude_ft),
        departure: args.departure.unwrap_or_else(Utc::now),
        sample_interval_nm: args.interval.unwrap_or(config.sample_interval_nm),
    };
    let report = planner.plan(request).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
