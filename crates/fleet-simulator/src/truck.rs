//! Per-truck runtime state and the single-tick advancement step.

use std::sync::Arc;

use chrono::Utc;
use fleet_domain::{Coordinate, Route, TruckFeature, bearing};
use rand::Rng;

use crate::error::{Result, SimulationError};

/// Outcome of one accepted tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Route point the truck was displayed at, before jitter.
    pub current: Coordinate,
    /// Route point the truck is heading to.
    pub next: Coordinate,
    /// `current` plus jitter.
    pub displayed: Coordinate,
    pub bearing: f64,
    /// Cursor after the tick, already wrapped.
    pub path_index: usize,
}

/// Mutable state of one simulated truck.
#[derive(Debug, Clone)]
pub struct TruckState {
    id: u32,
    route: Arc<Route>,
    path_index: usize,
    position: Coordinate,
    bearing: f64,
    ticks: u64,
}

impl TruckState {
    /// Park a truck at the first point of its route, heading north.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidRoute`] when the route is empty.
    pub fn new(id: u32, route: Arc<Route>) -> Result<Self> {
        let Some(&position) = route.get(0) else {
            return Err(SimulationError::InvalidRoute {
                truck_id: id,
                route: route.name().to_string(),
            });
        };
        Ok(Self {
            id,
            route,
            path_index: 0,
            position,
            bearing: 0.0,
            ticks: 0,
        })
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }

    #[must_use]
    pub const fn position(&self) -> Coordinate {
        self.position
    }

    #[must_use]
    pub const fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Accepted ticks; skipped ones are not counted.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one step along the loop.
    ///
    /// Displays the truck at the cursor's point plus up to `jitter_epsilon / 2`
    /// of noise per axis, points it at the following point (wrapping to the
    /// start), and moves the cursor on. State is only touched once the new fix
    /// is known to be finite.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::InvalidRoute`] if the route is empty.
    /// - [`SimulationError::Numeric`] if the fix is not finite; the truck is
    ///   left unchanged.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, jitter_epsilon: f64) -> Result<Tick> {
        let coordinates = self.route.coordinates();
        let len = coordinates.len();
        if len == 0 {
            return Err(SimulationError::InvalidRoute {
                truck_id: self.id,
                route: self.route.name().to_string(),
            });
        }

        let index = if self.path_index >= len { 0 } else { self.path_index };
        let current = coordinates[index];
        let next = if index + 1 < len {
            coordinates[index + 1]
        } else {
            coordinates[0]
        };

        let displayed = current.offset(
            (rng.gen_range(0.0..1.0) - 0.5) * jitter_epsilon,
            (rng.gen_range(0.0..1.0) - 0.5) * jitter_epsilon,
        );
        let heading = bearing(&displayed, &next);

        if !displayed.is_finite() || !heading.is_finite() {
            return Err(SimulationError::Numeric {
                truck_id: self.id,
                longitude: displayed.longitude,
                latitude: displayed.latitude,
                bearing: heading,
            });
        }

        self.position = displayed;
        self.bearing = heading;
        self.path_index = (index + 1) % len;
        self.ticks += 1;

        Ok(Tick {
            current,
            next,
            displayed,
            bearing: heading,
            path_index: self.path_index,
        })
    }

    /// Snapshot entry for the truck's current state.
    #[must_use]
    pub fn feature(&self) -> TruckFeature {
        TruckFeature {
            id: self.id,
            color: self.route.color().to_string(),
            route: self.route.name().to_string(),
            position: self.position,
            bearing: self.bearing,
            tick: self.ticks,
            updated_at: Utc::now(),
        }
    }
}
