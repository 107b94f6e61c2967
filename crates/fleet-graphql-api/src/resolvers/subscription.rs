//! # GraphQL Subscription Resolver
//!
//! Real-time fleet updates. Streams follow the snapshot's latest-value
//! semantics: a slow client skips intermediate snapshots instead of queueing.

use async_graphql::{Context, ErrorExtensions, Result, Subscription};
use futures_util::Stream;

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::schema::*;

/// GraphQL Subscription root
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Subscribe to fleet snapshots
    ///
    /// Emits the current snapshot immediately, then one per truck tick.
    #[graphql(name = "snapshotUpdates")]
    async fn snapshot_updates(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = FleetSnapshot>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let mut rx = api_ctx.broadcaster.subscribe();

        Ok(async_stream::stream! {
            let current = FleetSnapshot::from(&*rx.borrow_and_update());
            yield current;

            while rx.changed().await.is_ok() {
                let snapshot = FleetSnapshot::from(&*rx.borrow_and_update());
                yield snapshot;
            }
        })
    }

    /// Subscribe to a single truck
    ///
    /// Emits the truck's current state, then again each time it ticks.
    #[graphql(name = "truckUpdates")]
    async fn truck_updates(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Truck id to follow")] id: u32,
    ) -> Result<impl Stream<Item = Truck>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let mut rx = api_ctx.broadcaster.subscribe();

        if rx.borrow().get(id).is_none() {
            return Err(ApiError::truck_not_found(id).extend());
        }

        Ok(async_stream::stream! {
            let mut last_seen = None;
            loop {
                let truck = rx.borrow_and_update().get(id).map(Truck::from);
                if let Some(truck) = truck {
                    if last_seen != Some(truck.tick) {
                        last_seen = Some(truck.tick);
                        yield truck;
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Heartbeat subscription for connection keep-alive
    ///
    /// Emits a timestamp every second.
    #[graphql(name = "heartbeat")]
    async fn heartbeat(&self) -> impl Stream<Item = String> {
        async_stream::stream! {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                yield chrono::Utc::now().to_rfc3339();
            }
        }
    }
}
