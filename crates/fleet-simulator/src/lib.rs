//! # Fleet Simulator
//!
//! Simulates delivery trucks driving closed-loop routes and publishes the
//! fleet's positions and headings to any number of consumers.
//!
//! ## Features
//!
//! - Route catalog loaded once from JSON assets
//! - One independent tokio task per truck with randomized tick delays
//! - Cosmetic GPS jitter and great-circle bearing per tick
//! - Latest-value snapshot broadcast (pull, await, or callback)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let catalog = fleet_simulator::load_route_dir("data/routes")?;
//! let mut engine = SimulationEngine::new(&catalog, SimulationConfig::default())?;
//! engine.start();
//!
//! let mut rx = engine.subscribe();
//! while rx.changed().await.is_ok() {
//!     let snapshot = rx.borrow_and_update().clone();
//!     // render snapshot.to_feature_collection()
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod assets;
pub mod broadcaster;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod truck;

pub use assets::{load_route_dir, load_route_files, parse_route_json};
pub use broadcaster::{SnapshotBroadcaster, SnapshotReceiver, Subscription};
pub use catalog::RouteCatalog;
pub use config::{ConfigError, SimulationConfig};
pub use engine::{LoopSummary, SimulationEngine};
pub use error::{LoadError, Result, SimulationError};
pub use schedule::TickSchedule;
pub use truck::{Tick, TruckState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
