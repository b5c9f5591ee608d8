//! PostgreSQL store implementations.

pub mod session;
pub mod token;
pub mod user;

pub use session::PgSessionRepository;
pub use token::PgRefreshTokenRepository;
pub use user::PgUserRepository;

use sessionhub_core::error::{AppError, ErrorKind};

/// Wrap a sqlx error with context.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}
