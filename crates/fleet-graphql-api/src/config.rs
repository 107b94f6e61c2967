//! # API Configuration
//!
//! Environment-based configuration for the fleet GraphQL API service.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use fleet_simulator::config::env_or;
use fleet_simulator::{ConfigError, SimulationConfig};

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Directory of route JSON files
    pub routes_dir: PathBuf,

    /// Enable GraphQL Playground
    pub enable_playground: bool,

    /// Enable GraphQL introspection
    pub enable_introspection: bool,

    /// Maximum query depth
    pub max_query_depth: usize,

    /// Maximum query complexity
    pub max_query_complexity: usize,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Simulation engine settings
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is set to an unparsable value
    /// or the simulation settings are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            server_addr: env_or("SERVER_ADDR", defaults.server_addr)?,

            routes_dir: env::var("ROUTES_DIR").map_or(defaults.routes_dir, PathBuf::from),

            enable_playground: env::var("ENABLE_PLAYGROUND")
                .map_or(defaults.enable_playground, |v| v == "true" || v == "1"),

            enable_introspection: env::var("ENABLE_INTROSPECTION")
                .map_or(defaults.enable_introspection, |v| v == "true" || v == "1"),

            max_query_depth: env_or("MAX_QUERY_DEPTH", defaults.max_query_depth)?,

            max_query_complexity: env_or("MAX_QUERY_COMPLEXITY", defaults.max_query_complexity)?,

            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            cors_origins: env::var("CORS_ORIGINS").map_or(defaults.cors_origins, |v| {
                v.split(',').map(|s| s.trim().to_string()).collect()
            }),

            simulation: SimulationConfig::from_env()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            routes_dir: PathBuf::from("data/routes"),
            enable_playground: true,
            enable_introspection: true,
            max_query_depth: 10,
            max_query_complexity: 1000,
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
            simulation: SimulationConfig::default(),
        }
    }
}
