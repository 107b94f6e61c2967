//! Simulator error types.

use thiserror::Error;

pub use fleet_domain::LoadError;

use crate::config::ConfigError;

/// Simulation errors.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The route has no coordinates; the truck's loop stops.
    #[error("Truck {truck_id} is assigned to empty route '{route}'")]
    InvalidRoute { truck_id: u32, route: String },

    /// A tick produced a non-finite position or bearing; the tick is dropped.
    #[error(
        "Truck {truck_id} produced a non-finite fix: ({longitude}, {latitude}) bearing {bearing}"
    )]
    Numeric {
        truck_id: u32,
        longitude: f64,
        latitude: f64,
        bearing: f64,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl SimulationError {
    /// Whether the error ends the truck's scheduling loop.
    #[must_use]
    pub const fn is_fatal_for_truck(&self) -> bool {
        !matches!(self, Self::Numeric { .. })
    }
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
