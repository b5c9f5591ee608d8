//! PostgreSQL pool for the `postgres` backend.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use sessionhub_core::config::database::DatabaseConfig;
use sessionhub_core::error::{AppError, ErrorKind};
use sessionhub_core::result::AppResult;

/// Shared sqlx pool. Cloning is cheap; every repository holds its own handle.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    inner: PgPool,
}

impl DatabasePool {
    /// Opens the pool described by `config`. An empty URL is a configuration error.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres backend",
            ));
        }

        info!(
            endpoint = %redact_credentials(&config.url),
            max_connections = config.max_connections,
            "Opening PostgreSQL pool"
        );

        let inner = pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Could not reach PostgreSQL", e)
            })?;

        Ok(Self { inner })
    }

    /// Handle for repositories and the migrator.
    pub fn handle(&self) -> PgPool {
        self.inner.clone()
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.inner)
            .await
            .map(|_| ())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "PostgreSQL ping failed", e))
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        self.inner.close().await;
        info!("PostgreSQL pool closed");
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
}

/// `scheme://host/db` with any `user:password@` part replaced by `***@`.
fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}
