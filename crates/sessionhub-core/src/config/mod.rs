//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! `config/default.toml`, an optional environment overlay, and environment
//! variables. Each sub-module represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod rate_limit;
pub mod realtime;
pub mod session;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::rate_limit::RateLimitConfig;
use self::realtime::RealtimeConfig;
use self::session::SessionConfig;

use crate::error::AppError;

/// Plain environment variables honoured on top of `SESSIONHUB__*`, mapped
/// to the configuration key they override.
pub const PLAIN_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("ACCESS_TOKEN_TTL", "auth.access_token_ttl"),
    ("REFRESH_TOKEN_TTL", "auth.refresh_token_ttl"),
    ("SESSION_TIMEOUT", "session.timeout"),
    ("SESSION_LIFETIME", "session.lifetime"),
    ("MAX_SESSIONS_PER_USER", "session.max_per_user"),
    ("SWEEP_INTERVAL", "session.sweep_interval"),
];

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the process environment.
    ///
    /// Merges the default configuration with an environment-specific overlay,
    /// variables prefixed with `SESSIONHUB__`, and finally the plain
    /// variables listed in [`PLAIN_ENV_OVERRIDES`].
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_with(env, |name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable lookup for the plain
    /// override variables.
    pub fn load_with(env: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SESSIONHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for &(var, key) in PLAIN_ENV_OVERRIDES {
            builder = builder.set_override_option(key, lookup(var))?;
        }

        let config = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject combinations that would make the service misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.session.sweep_interval < Duration::from_secs(1) {
            return Err(AppError::configuration(
                "session.sweep_interval must be at least 1s",
            ));
        }
        if self.session.max_per_user == 0 {
            return Err(AppError::configuration(
                "session.max_per_user must be at least 1",
            ));
        }
        if self.session.timeout.is_zero() {
            return Err(AppError::configuration("session.timeout must be non-zero"));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.session.sweep_batch_size == 0 {
            return Err(AppError::configuration(
                "session.sweep_batch_size must be at least 1",
            ));
        }
        Ok(())
    }
}
