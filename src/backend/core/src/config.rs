//! Configuration management.
//!
//! Values come from an optional file layered under `GRANTLINE__*`
//! environment variables, e.g. `GRANTLINE__CACHE__MAX_ENTRIES=5000` or
//! `GRANTLINE__CACHE__TTL=10m`.

use serde::{Deserialize, Serialize};

use crate::cache::AuthorizationCacheConfig;
use crate::error::Result;
use crate::telemetry::LoggingConfig;

const ENV_PREFIX: &str = "GRANTLINE";
const ENV_SEPARATOR: &str = "__";

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Authorization cache bounds
    #[serde(default)]
    pub cache: AuthorizationCacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Environment (development, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: AuthorizationCacheConfig::default(),
            logging: LoggingConfig::default(),
            environment: default_environment(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with the environment layered on top.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
