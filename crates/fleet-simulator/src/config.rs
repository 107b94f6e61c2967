//! Simulation configuration.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Cosmetic GPS noise amplitude in degrees (~4m of latitude).
pub const DEFAULT_JITTER_EPSILON: f64 = 0.00004;

/// Lower bound of the inter-tick delay, inclusive.
pub const DEFAULT_MIN_TICK_DELAY_MS: u64 = 2000;

/// Upper bound of the inter-tick delay, exclusive.
pub const DEFAULT_MAX_TICK_DELAY_MS: u64 = 5000;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Jitter epsilon must be finite and non-negative, got {0}")]
    InvalidJitter(f64),

    #[error("Tick delay bounds must satisfy min < max, got [{min}, {max}) ms")]
    InvalidDelayBounds { min: u64, max: u64 },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Tuning knobs for the simulation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Jitter amplitude; each axis moves by at most half of it.
    pub jitter_epsilon: f64,

    pub min_tick_delay_ms: u64,

    pub max_tick_delay_ms: u64,

    /// Fixed RNG seed. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but does not
    /// parse, or any validation error from [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            jitter_epsilon: env_or("FLEET_JITTER_EPSILON", DEFAULT_JITTER_EPSILON)?,
            min_tick_delay_ms: env_or("FLEET_MIN_TICK_DELAY_MS", DEFAULT_MIN_TICK_DELAY_MS)?,
            max_tick_delay_ms: env_or("FLEET_MAX_TICK_DELAY_MS", DEFAULT_MAX_TICK_DELAY_MS)?,
            seed: env_opt("FLEET_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Same configuration without positional noise.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter_epsilon = 0.0;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns an error for a negative or non-finite jitter, or an empty
    /// delay range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.jitter_epsilon.is_finite() || self.jitter_epsilon < 0.0 {
            return Err(ConfigError::InvalidJitter(self.jitter_epsilon));
        }
        if self.min_tick_delay_ms >= self.max_tick_delay_ms {
            return Err(ConfigError::InvalidDelayBounds {
                min: self.min_tick_delay_ms,
                max: self.max_tick_delay_ms,
            });
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            jitter_epsilon: DEFAULT_JITTER_EPSILON,
            min_tick_delay_ms: DEFAULT_MIN_TICK_DELAY_MS,
            max_tick_delay_ms: DEFAULT_MAX_TICK_DELAY_MS,
            seed: None,
        }
    }
}

/// Parse `key` if set, otherwise use `default`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when the variable does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    Ok(env_opt(key)?.unwrap_or(default))
}

fn env_opt<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_tick_delay_ms, 2000);
        assert_eq!(config.max_tick_delay_ms, 5000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SimulationConfig {
            jitter_epsilon: -1.0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidJitter(-1.0)));

        let config = SimulationConfig {
            min_tick_delay_ms: 5000,
            max_tick_delay_ms: 5000,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDelayBounds { min: 5000, max: 5000 })
        ));
    }

    #[test]
    fn test_builders() {
        let config = SimulationConfig::default().without_jitter().with_seed(7);
        assert_eq!(config.jitter_epsilon, 0.0);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_env_or_default_when_unset() {
        let value: u64 = env_or("FLEET_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
