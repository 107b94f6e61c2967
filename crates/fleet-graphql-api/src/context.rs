//! # API Context
//!
//! Shared state handed to GraphQL resolvers and REST handlers.

use std::sync::Arc;

use fleet_simulator::{RouteCatalog, SnapshotBroadcaster};

/// Application context shared across all GraphQL resolvers
#[derive(Clone)]
pub struct ApiContext {
    /// Live fleet snapshot
    pub broadcaster: SnapshotBroadcaster,

    /// Routes the fleet is driving
    pub routes: Arc<RouteCatalog>,
}

impl ApiContext {
    pub fn new(broadcaster: SnapshotBroadcaster, routes: RouteCatalog) -> Self {
        Self {
            broadcaster,
            routes: Arc::new(routes),
        }
    }
}
