//! # Fleet GraphQL API
//!
//! Serves the live delivery fleet simulation to map clients.
//!
//! ## Features
//!
//! - **Snapshot Queries**: current position and heading of every truck
//! - **Route Queries**: the loops being driven, with GeoJSON geometry
//! - **Subscriptions**: latest-value snapshot updates via WebSocket
//! - **GeoJSON Endpoints**: drop-in sources for web map layers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │        (GraphQL Endpoint + Playground + GeoJSON REST)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                async-graphql Schema                         │
//! │                (QueryRoot, SubscriptionRoot)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ApiContext                            │
//! │            (SnapshotBroadcaster, RouteCatalog)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SimulationEngine                          │
//! │                (one tokio task per truck)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;
pub mod resolvers;
pub mod schema;

use async_graphql::{EmptyMutation, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method},
    response::{Html, IntoResponse},
    routing::get,
};
use fleet_domain::TruckFeature;
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use context::ApiContext;
pub use error::{ApiError, ApiResult};
pub use resolvers::{QueryRoot, SubscriptionRoot};

/// GraphQL schema type
pub type ApiSchema = Schema<QueryRoot, EmptyMutation, SubscriptionRoot>;

/// Build the GraphQL schema with context
pub fn build_schema(ctx: ApiContext, config: &Config) -> ApiSchema {
    let builder = Schema::build(QueryRoot, EmptyMutation, SubscriptionRoot)
        .data(ctx)
        .limit_depth(config.max_query_depth)
        .limit_complexity(config.max_query_complexity);

    if config.enable_introspection {
        builder.finish()
    } else {
        builder.disable_introspection().finish()
    }
}

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: ApiSchema,
    pub ctx: ApiContext,
}

/// GraphQL endpoint handler
pub async fn graphql_handler(
    State(state): State<AppState>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

/// GraphQL Playground HTML
pub async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql")
            .subscription_endpoint("/graphql/ws"),
    ))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Fleet snapshot as a GeoJSON FeatureCollection of truck points
pub async fn snapshot_geojson(State(state): State<AppState>) -> Json<Value> {
    Json(state.ctx.broadcaster.current().to_feature_collection())
}

/// Routes as a GeoJSON FeatureCollection of closed line strings
pub async fn routes_geojson(State(state): State<AppState>) -> Json<Value> {
    let features: Vec<Value> = state
        .ctx
        .routes
        .routes()
        .iter()
        .map(|r| r.to_feature())
        .collect();
    Json(json!({ "type": "FeatureCollection", "features": features }))
}

/// Single truck by id
pub async fn truck_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TruckFeature>> {
    let id: u32 = id
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("truck id must be a non-negative integer, got '{id}'")))?;

    state
        .ctx
        .broadcaster
        .current()
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::truck_not_found(id))
}

/// Build the Axum router
pub fn build_router(schema: ApiSchema, ctx: ApiContext, config: &Config) -> Router {
    let state = AppState {
        schema: schema.clone(),
        ctx,
    };

    // CORS configuration
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(allow_origin)
        .allow_headers(Any);

    let graphql = if config.enable_playground {
        get(graphql_playground).post(graphql_handler)
    } else {
        axum::routing::post(graphql_handler)
    };

    Router::new()
        // GraphQL endpoints
        .route("/graphql", graphql)
        .route_service("/graphql/ws", GraphQLSubscription::new(schema))
        // GeoJSON sources
        .route("/snapshot.geojson", get(snapshot_geojson))
        .route("/routes.geojson", get(routes_geojson))
        .route("/trucks/{id}", get(truck_by_id))
        // Health check
        .route("/health", get(health_check))
        .route("/", get(|| async { "Delivery Fleet Tracker API" }))
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
