//! Route catalog: the immutable set of loops the fleet drives.

use std::sync::Arc;

use fleet_domain::{LoadError, Route, RouteSource};
use tracing::debug;

/// Ordered, immutable collection of validated routes.
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    routes: Vec<Arc<Route>>,
}

impl RouteCatalog {
    /// Validate every source and build the catalog in input order.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed source, or with [`LoadError::NoRoutes`]
    /// when `sources` is empty.
    pub fn load(sources: impl IntoIterator<Item = RouteSource>) -> Result<Self, LoadError> {
        let routes = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| source.into_route(index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_routes(routes)
    }

    /// # Errors
    ///
    /// Returns [`LoadError::NoRoutes`] when `routes` is empty.
    pub fn from_routes(routes: Vec<Route>) -> Result<Self, LoadError> {
        if routes.is_empty() {
            return Err(LoadError::NoRoutes);
        }

        for route in &routes {
            debug!(
                route = route.name(),
                color = route.color(),
                points = route.len(),
                degenerate = route.is_degenerate(),
                "Route loaded"
            );
        }

        Ok(Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        })
    }

    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Route>> {
        self.routes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
