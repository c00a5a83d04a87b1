//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SEGMENT_SERVICE` prefix and nested values use double underscores as separators.
//! The sweep period is the one exception: it is read from `TTL_CHECK_PERIOD`.
//!
//! # Example
//!
//! ```no_run
//! use segment_service::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod reports;
mod server;
mod sweeper;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use reports::ReportsConfig;
pub use server::{Environment, ServerConfig};
pub use sweeper::{SweeperConfig, TTL_CHECK_PERIOD_VAR};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Report export configuration
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Expiry sweeper configuration, filled from `TTL_CHECK_PERIOD`
    #[serde(skip)]
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SEGMENT_SERVICE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Reads the sweep period from `TTL_CHECK_PERIOD`
    ///
    /// # Environment Variable Format
    ///
    /// - `SEGMENT_SERVICE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SEGMENT_SERVICE__DATABASE__URL=...` -> `database.url = ...`
    /// - `TTL_CHECK_PERIOD=10m` -> `sweeper.check_period = 600s`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SEGMENT_SERVICE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.sweeper = SweeperConfig::from_env();
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.reports.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
