//! Fleet simulation engine.
//!
//! One tokio task per truck. Each task ticks immediately on start, then
//! sleeps for a freshly drawn delay before the next tick, until shutdown.
//! Trucks never wait on each other; the only shared state is the snapshot
//! behind [`SnapshotBroadcaster`].

use std::sync::Arc;

use fleet_domain::{Route, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::broadcaster::{SnapshotBroadcaster, SnapshotReceiver, Subscription};
use crate::catalog::RouteCatalog;
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::schedule::TickSchedule;
use crate::truck::TruckState;

/// How a truck's scheduling loop ended.
#[derive(Debug)]
pub struct LoopSummary {
    pub truck_id: u32,
    /// Ticks that reached the snapshot.
    pub ticks: u64,
    /// Set when the loop stopped on its own.
    pub error: Option<SimulationError>,
}

/// Fleet simulator owning the trucks and the authoritative snapshot.
#[derive(Debug)]
pub struct SimulationEngine {
    config: SimulationConfig,
    schedule: TickSchedule,
    broadcaster: SnapshotBroadcaster,
    /// Trucks waiting for [`Self::start`]; empty once running.
    parked: Vec<TruckState>,
    tasks: JoinSet<LoopSummary>,
    shutdown_tx: watch::Sender<bool>,
}

impl SimulationEngine {
    /// One truck per catalog route, ids in catalog order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error. Routes are validated on construction,
    /// so every truck can be parked.
    pub fn new(catalog: &RouteCatalog, config: SimulationConfig) -> Result<Self> {
        Self::with_assignments(catalog.routes().to_vec(), config)
    }

    /// One truck per entry; several trucks may share a route.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_assignments(routes: Vec<Arc<Route>>, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let schedule = TickSchedule::from_config(&config)?;

        let trucks = routes
            .into_iter()
            .zip(0u32..)
            .map(|(route, id)| TruckState::new(id, route))
            .collect::<Result<Vec<_>>>()?;

        let broadcaster = SnapshotBroadcaster::new(Snapshot::new(trucks.iter().map(TruckState::feature)));
        let (shutdown_tx, _) = watch::channel(false);

        info!(
            trucks = trucks.len(),
            jitter = config.jitter_epsilon,
            min_delay_ms = config.min_tick_delay_ms,
            max_delay_ms = config.max_tick_delay_ms,
            "Simulation engine created"
        );

        Ok(Self {
            config,
            schedule,
            broadcaster,
            parked: trucks,
            tasks: JoinSet::new(),
            shutdown_tx,
        })
    }

    /// Spawn one scheduling loop per truck. Calling it again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.parked.is_empty() {
            warn!("Simulation engine already started");
            return;
        }

        for truck in self.parked.drain(..) {
            let rng = match self.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(truck.id()))),
                None => StdRng::from_entropy(),
            };
            self.tasks.spawn(run_truck(
                truck,
                self.broadcaster.clone(),
                self.schedule.clone(),
                self.config.jitter_epsilon,
                rng,
                self.shutdown_tx.subscribe(),
            ));
        }

        info!(trucks = self.tasks.len(), "Simulation started");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.broadcaster.current()
    }

    #[must_use]
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.broadcaster.subscribe()
    }

    pub fn subscribe_with<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        self.broadcaster.subscribe_with(callback)
    }

    /// Handle for consumers that outlive borrows of the engine.
    #[must_use]
    pub fn broadcaster(&self) -> SnapshotBroadcaster {
        self.broadcaster.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Stop every truck loop and wait for them to finish. Pending timers are
    /// cancelled; no tick runs after this returns.
    pub async fn shutdown(mut self) -> Vec<LoopSummary> {
        self.shutdown_tx.send_replace(true);

        let mut summaries = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(err) => error!(error = %err, "Truck loop panicked"),
            }
        }
        summaries.sort_by_key(|s| s.truck_id);

        info!(
            trucks = summaries.len(),
            ticks = summaries.iter().map(|s| s.ticks).sum::<u64>(),
            "Simulation stopped"
        );
        summaries
    }
}

/// Scheduling loop for a single truck.
async fn run_truck(
    mut truck: TruckState,
    broadcaster: SnapshotBroadcaster,
    schedule: TickSchedule,
    jitter_epsilon: f64,
    mut rng: StdRng,
    mut shutdown: watch::Receiver<bool>,
) -> LoopSummary {
    let truck_id = truck.id();
    let mut ticks = 0;
    debug!(truck_id, route = truck.route().name(), "Truck loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match truck.advance(&mut rng, jitter_epsilon) {
            Ok(tick) => {
                broadcaster.publish(truck.feature());
                ticks += 1;
                trace!(
                    truck_id,
                    path_index = tick.path_index,
                    lon = tick.displayed.longitude,
                    lat = tick.displayed.latitude,
                    bearing = tick.bearing,
                    "Tick"
                );
            }
            Err(err) if err.is_fatal_for_truck() => {
                error!(truck_id, error = %err, "Truck loop stopped");
                return LoopSummary {
                    truck_id,
                    ticks,
                    error: Some(err),
                };
            }
            Err(err) => warn!(truck_id, error = %err, "Tick skipped"),
        }

        let delay = schedule.next_delay(&mut rng);
        trace!(truck_id, ?delay, "Next tick scheduled");

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    debug!(truck_id, ticks, "Truck loop finished");
    LoopSummary {
        truck_id,
        ticks,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::{Coordinate, RouteSource};
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn three_routes() -> RouteCatalog {
        RouteCatalog::load([
            RouteSource::new("r1", "#FF0000", &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]),
            RouteSource::new("r2", "#00AA00", &[(2.0, 2.0), (3.0, 2.0)]),
            RouteSource::new("r3", "#8585FF", &[(5.0, 5.0), (5.0, 6.0), (6.0, 6.0), (6.0, 5.0)]),
        ])
        .unwrap()
    }

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_seed(11)
    }

    #[test]
    fn test_initial_snapshot_parks_trucks() {
        let engine = SimulationEngine::new(&three_routes(), config()).unwrap();
        let snapshot = engine.snapshot();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.get(1).unwrap().position, Coordinate::new(2.0, 2.0));
        assert_eq!(snapshot.get(1).unwrap().color, "#00AA00");
        assert!(!engine.is_running());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = SimulationConfig {
            min_tick_delay_ms: 10,
            max_tick_delay_ms: 5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            SimulationEngine::new(&three_routes(), bad),
            Err(SimulationError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_ticks_every_truck_immediately() {
        let mut engine = SimulationEngine::new(&three_routes(), config()).unwrap();
        engine.start();
        assert!(engine.is_running());

        tokio::time::sleep(Duration::from_millis(1)).await;
        let snapshot = engine.snapshot();

        let ids: BTreeSet<u32> = snapshot.features().map(|f| f.id).collect();
        assert_eq!(ids, BTreeSet::from([0, 1, 2]));
        assert_eq!(snapshot.version, 3);
        for feature in snapshot.features() {
            assert!(feature.position.is_finite());
            assert!((0.0..360.0).contains(&feature.bearing));
        }

        let summaries = engine.shutdown().await;
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.ticks == 1 && s.error.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_delay_bounds() {
        let mut engine = SimulationEngine::new(&three_routes(), config()).unwrap();
        engine.start();

        // Nobody can tick twice before the minimum delay.
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(engine.snapshot().version, 3);

        // Everyone has ticked at least twice by the maximum delay.
        tokio::time::sleep(Duration::from_millis(3001)).await;
        let summaries = engine.shutdown().await;
        assert!(summaries.iter().all(|s| s.ticks >= 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_receive_updates() {
        let mut engine = SimulationEngine::new(&three_routes(), config()).unwrap();
        let mut rx = engine.subscribe();
        engine.start();

        tokio_test::assert_ok!(rx.changed().await);
        let first = rx.borrow_and_update().version;
        assert!(first >= 1);

        tokio_test::assert_ok!(rx.changed().await);
        assert!(rx.borrow_and_update().version > first);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_shutdown() {
        let mut engine = SimulationEngine::new(&three_routes(), config()).unwrap();
        let broadcaster = engine.broadcaster();
        engine.start();

        tokio::time::sleep(Duration::from_secs(30)).await;
        engine.shutdown().await;
        let version = broadcaster.current().version;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(broadcaster.current().version, version);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trucks_sharing_a_route_both_advance() {
        let route = three_routes().routes()[0].clone();
        let mut engine =
            SimulationEngine::with_assignments(vec![route.clone(), route], config()).unwrap();
        engine.start();

        tokio::time::sleep(Duration::from_secs(60)).await;
        let summaries = engine.shutdown().await;

        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.ticks >= 12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_ticks_are_skipped_without_stopping_truck() {
        use std::sync::atomic::{AtomicBool, Ordering};

        // With jitter this wide, a point at f64::MAX overflows unless both
        // draws land below the midpoint; the origin never does.
        let edge = Arc::new(
            Route::new("edge", "#000", vec![Coordinate::new(f64::MAX, f64::MAX)]).unwrap(),
        );
        let good = Arc::new(Route::new("good", "#fff", vec![Coordinate::new(0.0, 0.0)]).unwrap());
        let config = SimulationConfig {
            jitter_epsilon: f64::MAX,
            ..config()
        };

        let mut engine = SimulationEngine::with_assignments(vec![edge, good], config).unwrap();
        let corrupt = Arc::new(AtomicBool::new(false));
        let seen = corrupt.clone();
        let _sub = engine.subscribe_with(move |snapshot| {
            if snapshot.features().any(|f| !f.position.is_finite() || !f.bearing.is_finite()) {
                seen.store(true, Ordering::SeqCst);
            }
        });
        let broadcaster = engine.broadcaster();
        engine.start();

        tokio::time::sleep(Duration::from_secs(60)).await;
        let summaries = engine.shutdown().await;
        let snapshot = broadcaster.current();

        assert!(!corrupt.load(Ordering::SeqCst));
        assert!(summaries.iter().all(|s| s.error.is_none()));
        // At least 12 attempts each in 60s; the edge truck drops most of its own.
        assert!(summaries[1].ticks >= 12);
        assert!(summaries[0].ticks < 12);
        assert_eq!(snapshot.version, summaries.iter().map(|s| s.ticks).sum::<u64>());
        assert_eq!(snapshot.get(0).unwrap().tick, summaries[0].ticks);
        assert!(snapshot.get(0).unwrap().position.is_finite());
    }
}
