//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod auth;
pub mod counters;
pub mod database;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::counters::{CounterBackend, CounterStoreConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::rate_limit::RateLimitConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Deserialization target for the merged TOML configuration files
/// (default.toml + environment overlay + `TENANTAUTH__*` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Login failure counter store.
    #[serde(default)]
    pub counters: CounterStoreConfig,
    /// Token and credential settings.
    pub auth: AuthConfig,
    /// Login failure throttling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TENANTAUTH_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = ::config::Config::builder()
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                ::config::Environment::with_prefix("TENANTAUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.database.validate()?;
        self.auth.validate()?;
        self.rate_limit.validate()
    }
}

/// Replaces the userinfo part of a connection URL so it can be logged.
///
/// `postgres://auth:pw@db/x` becomes `postgres://***@db/x`; URLs without
/// credentials are returned unchanged.
pub fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
