//! Expiration sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sessionhub_auth::{RateLimiter, SessionStore, TokenService};
use sessionhub_core::config::session::SessionConfig;
use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_realtime::BroadcastDispatcher;

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Session rows deleted.
    pub sessions_removed: usize,
    /// Users sent a `session-expired` logout.
    pub users_notified: usize,
    /// Refresh-token rows past their absolute expiry that were dropped.
    pub tokens_purged: u64,
    /// Idle rate-limit windows dropped.
    pub windows_pruned: usize,
    /// Whether shutdown interrupted the batch loop.
    pub cancelled: bool,
}

/// Deletes sessions idle past their deadline and tells their owners.
///
/// Expired rows are fetched and deleted in batches. Cancellation is
/// honoured between batches; rows already deleted are still announced.
pub struct ExpirationSweeper {
    sessions: Arc<SessionStore>,
    tokens: Arc<TokenService>,
    dispatcher: Arc<BroadcastDispatcher>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
    batch_size: usize,
}

impl std::fmt::Debug for ExpirationSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationSweeper")
            .field("interval", &self.interval)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl ExpirationSweeper {
    /// Creates a new sweeper.
    pub fn new(
        config: &SessionConfig,
        sessions: Arc<SessionStore>,
        tokens: Arc<TokenService>,
        dispatcher: Arc<BroadcastDispatcher>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            dispatcher,
            limiter,
            interval: config.sweep_interval,
            batch_size: config.sweep_batch_size.max(1),
        }
    }

    /// Sweeps on every interval tick until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            batch_size = self.batch_size,
            "Expiration sweeper started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Expiration sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep_once(&cancel).await {
                        Ok(report) if report.sessions_removed > 0 => {
                            info!(
                                removed = report.sessions_removed,
                                users = report.users_notified,
                                tokens_purged = report.tokens_purged,
                                "Expired sessions swept"
                            );
                        }
                        Ok(_) => debug!("Sweep found no expired sessions"),
                        Err(e) => error!(error = %e, "Expiration sweep failed"),
                    }
                }
            }
        }
    }

    /// One full sweep.
    pub async fn sweep_once(&self, cancel: &CancellationToken) -> AppResult<SweepReport> {
        let mut report = SweepReport::default();
        let mut by_user: HashMap<UserId, Vec<SessionId>> = HashMap::new();

        let outcome = self.delete_batches(cancel, &mut by_user, &mut report).await;

        // Rows already deleted are announced even if a later batch failed.
        for (user_id, session_ids) in by_user {
            debug!(user_id = %user_id, count = session_ids.len(), "Notifying expired sessions");
            self.dispatcher.session_expired(user_id, session_ids).await;
            report.users_notified += 1;
        }
        outcome?;

        if !report.cancelled {
            report.tokens_purged = self.tokens.purge_expired().await?;
            report.windows_pruned = self.limiter.prune();
        }
        Ok(report)
    }

    async fn delete_batches(
        &self,
        cancel: &CancellationToken,
        by_user: &mut HashMap<UserId, Vec<SessionId>>,
        report: &mut SweepReport,
    ) -> AppResult<()> {
        loop {
            if cancel.is_cancelled() {
                info!(removed = report.sessions_removed, "Sweep interrupted by shutdown");
                report.cancelled = true;
                return Ok(());
            }

            let batch = self.sessions.find_expired(self.batch_size).await?;
            if batch.is_empty() {
                return Ok(());
            }
            let ids: Vec<SessionId> = batch.iter().map(|s| s.session_id).collect();

            // Rows deleted concurrently since the query are skipped here.
            let removed = self.sessions.delete_expired(&ids).await?;
            for session in &removed {
                if let Err(e) = self.tokens.revoke_session(session.session_id).await {
                    warn!(session_id = %session.session_id, error = %e, "Failed to revoke swept session tokens");
                }
                by_user
                    .entry(session.user_id)
                    .or_default()
                    .push(session.session_id);
            }
            report.sessions_removed += removed.len();

            if batch.len() < self.batch_size || removed.is_empty() {
                return Ok(());
            }
        }
    }
}
