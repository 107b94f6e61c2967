//! Randomized inter-tick delays.

use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::config::{ConfigError, SimulationConfig};

/// Uniform delay distribution over `[min, max)` milliseconds, redrawn per tick.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    min_ms: u64,
    max_ms: u64,
    delay_ms: Uniform<u64>,
}

impl TickSchedule {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelayBounds`] unless `min_ms < max_ms`.
    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        if min_ms >= max_ms {
            return Err(ConfigError::InvalidDelayBounds {
                min: min_ms,
                max: max_ms,
            });
        }
        Ok(Self {
            min_ms,
            max_ms,
            delay_ms: Uniform::new(min_ms, max_ms),
        })
    }

    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::new(config.min_tick_delay_ms, config.max_tick_delay_ms)
    }

    /// Draw the delay before a truck's next tick.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(self.delay_ms.sample(rng))
    }

    #[must_use]
    pub const fn bounds_ms(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }
}
