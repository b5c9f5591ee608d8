//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use sessionhub_core::error::{AppError, ErrorKind};

/// Apply the session, refresh-token and user schema.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Applying session schema migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Session schema is up to date");
    Ok(())
}
