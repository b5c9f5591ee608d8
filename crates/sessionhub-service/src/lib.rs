//! # sessionhub-service
//!
//! Application use cases built on the session/token engine. Each service
//! follows constructor injection: every dependency is handed in as an
//! `Arc` at construction time.
//!
//! Every operation that removes a session follows the same order: the
//! store deletes and hands back the row, then tokens are revoked, then
//! the broadcast is built from the returned row.

pub mod auth;
pub mod context;
pub mod session;

#[cfg(test)]
mod testing;

pub use auth::{AuthService, LoginOutcome};
pub use context::ClientInfo;
pub use session::{SessionService, SessionStatus, SessionView};
