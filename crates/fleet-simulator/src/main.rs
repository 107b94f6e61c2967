//! Delivery Fleet Simulator CLI
//!
//! Drives trucks along their routes and streams snapshot updates to the log
//! or, with `--geojson`, to stdout as one FeatureCollection per line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use fleet_simulator::{
    SimulationConfig, SimulationEngine, config::DEFAULT_JITTER_EPSILON, load_route_dir,
    load_route_files,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fleet-simulator")]
#[command(about = "Simulate delivery trucks driving closed-loop routes")]
struct Args {
    /// Route JSON files; defaults to every file in --routes-dir
    #[arg(value_name = "ROUTE_FILE")]
    routes: Vec<PathBuf>,

    /// Directory scanned for *.json routes when no files are given
    #[arg(long, default_value = "data/routes")]
    routes_dir: PathBuf,

    /// GPS jitter amplitude in degrees
    #[arg(long, default_value_t = DEFAULT_JITTER_EPSILON)]
    jitter: f64,

    /// Minimum delay between a truck's ticks (inclusive)
    #[arg(long, default_value = "2000")]
    min_delay_ms: u64,

    /// Maximum delay between a truck's ticks (exclusive)
    #[arg(long, default_value = "5000")]
    max_delay_ms: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Print each snapshot as a GeoJSON FeatureCollection line
    #[arg(long)]
    geojson: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fleet_simulator=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let catalog = if args.routes.is_empty() {
        load_route_dir(&args.routes_dir)?
    } else {
        load_route_files(&args.routes)?
    };

    let config = SimulationConfig {
        jitter_epsilon: args.jitter,
        min_tick_delay_ms: args.min_delay_ms,
        max_tick_delay_ms: args.max_delay_ms,
        seed: args.seed,
    };

    info!(
        version = fleet_simulator::VERSION,
        routes = catalog.len(),
        "Starting fleet simulation"
    );
    for route in catalog.routes() {
        info!("  {} ({}) - {} points", route.name(), route.color(), route.len());
    }

    let mut engine = SimulationEngine::new(&catalog, config)?;
    let geojson = args.geojson;
    let subscription = engine.subscribe_with(move |snapshot| {
        if geojson {
            println!("{}", snapshot.to_feature_collection());
            return;
        }
        // Most recently moved truck
        if let Some(truck) = snapshot.features().max_by_key(|f| f.updated_at) {
            info!(
                "#{} v{} | {} | ({:.6}, {:.6}) | heading {:>5.1}°",
                truck.id,
                snapshot.version,
                truck.route,
                truck.position.longitude,
                truck.position.latitude,
                truck.bearing
            );
        }
    });

    engine.start();

    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(secs)) => info!("Run duration elapsed"),
                res = tokio::signal::ctrl_c() => {
                    res?;
                    info!("Received Ctrl+C, shutting down");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    subscription.unsubscribe();
    let summaries = engine.shutdown().await;

    info!("=== FINAL TICK COUNTS ===");
    for summary in &summaries {
        match &summary.error {
            Some(err) => warn!("#{} - {} ticks, stopped: {}", summary.truck_id, summary.ticks, err),
            None => info!("#{} - {} ticks", summary.truck_id, summary.ticks),
        }
    }

    Ok(())
}
