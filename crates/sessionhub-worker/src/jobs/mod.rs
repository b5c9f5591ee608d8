//! Periodic job implementations.

pub mod heartbeat;
pub mod sweep;
