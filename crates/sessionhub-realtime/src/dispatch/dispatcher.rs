//! Broadcast dispatcher, the single writer of session-lifecycle events.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::debug;

use sessionhub_core::types::id::{SessionId, UserId};

use crate::connection::{ConnectionHandle, ConnectionRegistry};
use crate::message::ServerEvent;

/// Publishes events to every live connection of a user.
///
/// Sends run concurrently, each under its own timeout. A failed send
/// removes that handle from the registry and is never reported to the
/// operation that triggered the broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl BroadcastDispatcher {
    /// Creates a new dispatcher.
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Fans `event` out to every handle of `user_id`. Returns the number of
    /// connections that accepted it.
    pub async fn notify(&self, user_id: UserId, event: ServerEvent) -> usize {
        let handles = self.registry.snapshot(user_id);
        if handles.is_empty() {
            debug!(user_id = %user_id, event = event.kind(), "No live connections to notify");
            return 0;
        }
        self.deliver(handles, event).await
    }

    /// Targeted logout of one session.
    pub async fn device_logout(
        &self,
        user_id: UserId,
        session_id: SessionId,
        message: &str,
    ) -> usize {
        self.notify(user_id, ServerEvent::device_logout(session_id, message))
            .await
    }

    /// Logout of every session of `user_id` except `keep`.
    pub async fn logout_all_devices(&self, user_id: UserId, keep: SessionId) -> usize {
        self.notify(user_id, ServerEvent::logout_all_devices(keep))
            .await
    }

    /// One expiry notice for all of a user's swept sessions.
    pub async fn session_expired(&self, user_id: UserId, session_ids: Vec<SessionId>) -> usize {
        self.notify(user_id, ServerEvent::session_expired(session_ids))
            .await
    }

    /// Session-list-changed hint.
    pub async fn session_update(&self, user_id: UserId) -> usize {
        self.notify(user_id, ServerEvent::session_update()).await
    }

    /// Keepalive to every connection; prunes the ones that fail.
    pub async fn heartbeat_all(&self, now: DateTime<Utc>) -> usize {
        let handles = self.registry.snapshot_all();
        if handles.is_empty() {
            return 0;
        }
        self.deliver(handles, ServerEvent::heartbeat(now)).await
    }

    async fn deliver(&self, handles: Vec<Arc<ConnectionHandle>>, event: ServerEvent) -> usize {
        let kind = event.kind();
        let timeout = self.send_timeout;

        let results = join_all(handles.iter().map(|handle| {
            let event = event.clone();
            async move { handle.send(event, timeout).await }
        }))
        .await;

        let mut delivered = 0;
        for (handle, ok) in handles.iter().zip(results) {
            if ok {
                delivered += 1;
            } else {
                debug!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    event = kind,
                    "Pruning connection after failed send"
                );
                self.registry.unregister(handle.user_id, handle.id);
            }
        }
        delivered
    }
}
