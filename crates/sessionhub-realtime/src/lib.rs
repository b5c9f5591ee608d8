//! # sessionhub-realtime
//!
//! Push-channel side of the session lifecycle:
//!
//! - `connection`: handles, the per-user registry and handshake authentication
//! - `dispatch`: concurrent, time-bounded fan-out with self-healing pruning
//! - `message`: JSON wire events
//! - `client`: the receiver-side exclusion rule for `force-logout`

pub mod client;
pub mod connection;
pub mod dispatch;
pub mod message;
pub mod server;

pub use client::should_honor;
pub use connection::{ConnectionAuthenticator, ConnectionHandle, ConnectionRegistry};
pub use dispatch::BroadcastDispatcher;
pub use message::{ClientMessage, ForceLogoutReason, ServerEvent};
pub use server::RealtimeEngine;
