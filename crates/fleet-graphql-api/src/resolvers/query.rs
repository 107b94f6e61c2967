//! # GraphQL Query Resolver
//!
//! Read operations for the fleet API.

use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::schema::*;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Current fleet snapshot
    async fn snapshot(&self, ctx: &Context<'_>) -> Result<FleetSnapshot> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(FleetSnapshot::from(&api_ctx.broadcaster.current()))
    }

    /// Current state of a single truck
    async fn truck(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Truck id (fleet position)")] id: u32,
    ) -> Result<Truck> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let snapshot = api_ctx.broadcaster.current();

        tracing::debug!(truck_id = id, "Fetching truck");

        snapshot
            .get(id)
            .map(Truck::from)
            .ok_or_else(|| ApiError::truck_not_found(id).extend())
    }

    /// Routes driven by the fleet, in truck id order
    async fn routes(&self, ctx: &Context<'_>) -> Result<Vec<Route>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(api_ctx
            .routes
            .routes()
            .iter()
            .map(|r| Route::from(r.as_ref()))
            .collect())
    }
}
