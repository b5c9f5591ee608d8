//! Backend selection: one set of stores per configured backend.

use std::sync::Arc;

use tracing::info;

use sessionhub_core::config::database::{DatabaseBackend, DatabaseConfig};
use sessionhub_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::{MemoryRefreshTokenRepository, MemorySessionRepository, MemoryUserRepository};
use crate::migration::run_migrations;
use crate::repositories::{PgRefreshTokenRepository, PgSessionRepository, PgUserRepository};
use crate::store::{RefreshTokenRepository, SessionRepository, UserRepository};

/// The three stores the service runs on.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Credential store.
    pub users: Arc<dyn UserRepository>,
    /// Session rows.
    pub sessions: Arc<dyn SessionRepository>,
    /// Hashed refresh tokens.
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    /// Pool behind the stores, when they are PostgreSQL-backed.
    pub pool: Option<DatabasePool>,
}

impl Backends {
    /// Process-local stores.
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
            refresh_tokens: Arc::new(MemoryRefreshTokenRepository::new()),
            pool: None,
        }
    }

    /// PostgreSQL stores sharing `pool`.
    pub fn postgres(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.handle())),
            sessions: Arc::new(PgSessionRepository::new(pool.handle())),
            refresh_tokens: Arc::new(PgRefreshTokenRepository::new(pool.handle())),
            pool: Some(pool),
        }
    }

    /// Builds the configured backend, connecting and migrating when needed.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory session store");
                Ok(Self::memory())
            }
            DatabaseBackend::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                run_migrations(&pool.handle()).await?;
                Ok(Self::postgres(pool))
            }
        }
    }
}
