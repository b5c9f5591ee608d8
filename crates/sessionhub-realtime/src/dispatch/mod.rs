//! Fan-out of session-lifecycle events.

pub mod dispatcher;

pub use dispatcher::BroadcastDispatcher;
