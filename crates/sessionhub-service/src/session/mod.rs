//! Self-service session management.

pub mod service;

pub use service::{SessionService, SessionStatus, SessionView};
