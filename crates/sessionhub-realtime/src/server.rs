//! Top-level real-time engine that ties the registry and dispatcher together.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use sessionhub_auth::RequestPipeline;
use sessionhub_core::config::realtime::RealtimeConfig;

use crate::connection::{ConnectionAuthenticator, ConnectionRegistry};
use crate::dispatch::BroadcastDispatcher;

/// Central real-time engine shared by handlers, services and workers.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Event fan-out.
    pub dispatcher: Arc<BroadcastDispatcher>,
    /// Handshake verification.
    pub authenticator: ConnectionAuthenticator,
    /// How long a client has to authenticate after upgrading.
    pub handshake_timeout: Duration,
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: &RealtimeConfig, pipeline: Arc<RequestPipeline>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.channel_buffer_size));
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            Arc::clone(&registry),
            config.send_timeout,
        ));

        info!("Real-time engine initialized");

        Self {
            registry,
            dispatcher,
            authenticator: ConnectionAuthenticator::new(pipeline),
            handshake_timeout: config.handshake_timeout,
        }
    }

    /// Closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.registry.close_all();
    }
}
