//! # Delivery Fleet GraphQL API Server
//!
//! Binary entry point: loads routes, starts the simulation and serves it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_graphql_api::{ApiContext, Config, build_router, build_schema};
use fleet_simulator::{SimulationEngine, load_route_dir};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = fleet_graphql_api::VERSION,
        "Starting Delivery Fleet GraphQL API"
    );

    // Load routes and start the simulation
    tracing::info!(dir = %config.routes_dir.display(), "Loading routes");
    let catalog = load_route_dir(&config.routes_dir)?;

    let mut engine = SimulationEngine::new(&catalog, config.simulation.clone())?;
    engine.start();

    // Build API context
    let api_ctx = ApiContext::new(engine.broadcaster(), catalog);

    // Build GraphQL schema
    let schema = build_schema(api_ctx.clone(), &config);

    tracing::info!(
        playground = config.enable_playground,
        introspection = config.enable_introspection,
        max_depth = config.max_query_depth,
        max_complexity = config.max_query_complexity,
        "GraphQL schema built"
    );

    // Build router
    let app = build_router(schema, api_ctx, &config);

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("GraphQL Playground available at http://{}/graphql", addr);
    tracing::info!("WebSocket subscriptions at ws://{}/graphql/ws", addr);
    tracing::info!("Truck GeoJSON at http://{}/snapshot.geojson", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop truck timers before the snapshot is released
    engine.shutdown().await;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
