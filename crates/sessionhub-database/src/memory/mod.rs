//! Process-local store implementations guarded by `tokio::sync::Mutex`.
//!
//! Suitable for single-node deployments and tests. Every compound
//! operation runs under one lock acquisition, so it is atomic with respect
//! to every other operation on the same store.

pub mod session;
pub mod token;
pub mod user;

pub use session::MemorySessionRepository;
pub use token::MemoryRefreshTokenRepository;
pub use user::MemoryUserRepository;
