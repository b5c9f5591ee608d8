//! # sessionhub-database
//!
//! Persistence for sessions, refresh tokens and user credentials.
//!
//! Each store is a trait in [`store`] with two implementations: a
//! process-local one in [`memory`] and a PostgreSQL one in
//! [`repositories`]. Compound operations (evict-then-insert,
//! read-then-delete) are atomic per user in both.

pub mod backend;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use backend::Backends;
pub use connection::DatabasePool;
pub use store::{RefreshTokenRepository, SessionRepository, SessionTouch, UserRepository};
