//! Worker runner: owns the background tasks for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::jobs::heartbeat::HeartbeatJob;
use crate::jobs::sweep::ExpirationSweeper;

/// Running background tasks sharing one cancellation token.
#[derive(Debug)]
pub struct WorkerRunner {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl WorkerRunner {
    /// Spawns the sweeper and heartbeat tasks.
    pub fn start(
        sweeper: Arc<ExpirationSweeper>,
        heartbeat: HeartbeatJob,
        cancel: CancellationToken,
    ) -> Self {
        let tasks = vec![
            ("expiration_sweeper", tokio::spawn(sweeper.run(cancel.clone()))),
            ("heartbeat", tokio::spawn(heartbeat.run(cancel.clone()))),
        ];
        info!(count = tasks.len(), "Background tasks started");
        Self { cancel, tasks }
    }

    /// Cancels every task and waits up to `grace` for each to finish.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();

        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => info!(task = name, "Background task stopped"),
                Ok(Err(e)) => error!(task = name, error = %e, "Background task panicked"),
                Err(_) => {
                    warn!(task = name, "Background task did not stop in time, aborting");
                    handle.abort();
                }
            }
        }
    }
}
