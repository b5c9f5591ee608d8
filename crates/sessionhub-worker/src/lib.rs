//! Background tasks for SessionHub.
//!
//! This crate provides:
//! - The expiration sweeper that deletes idle sessions and notifies owners
//! - The heartbeat job that keeps push connections alive and prunes dead ones
//! - A runner that owns both tasks and stops them on shutdown

pub mod jobs;
pub mod runner;

pub use jobs::heartbeat::HeartbeatJob;
pub use jobs::sweep::{ExpirationSweeper, SweepReport};
pub use runner::WorkerRunner;
