//! Push-channel keepalive.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sessionhub_core::traits::Clock;
use sessionhub_realtime::BroadcastDispatcher;

/// Sends `heartbeat` to every open connection at a fixed interval.
///
/// Connections that cannot take the event are pruned by the dispatcher.
pub struct HeartbeatJob {
    dispatcher: Arc<BroadcastDispatcher>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl std::fmt::Debug for HeartbeatJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatJob")
            .field("interval", &self.interval)
            .finish()
    }
}

impl HeartbeatJob {
    /// Creates a new heartbeat job.
    pub fn new(
        dispatcher: Arc<BroadcastDispatcher>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            dispatcher,
            clock,
            interval,
        }
    }

    /// Beats until `cancel` fires. The first beat is one interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Heartbeat job started");

        let mut interval = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Heartbeat job stopping");
                    break;
                }
                _ = interval.tick() => {
                    let delivered = self.dispatcher.heartbeat_all(self.clock.now()).await;
                    debug!(delivered, "Heartbeat sent");
                }
            }
        }
    }
}
