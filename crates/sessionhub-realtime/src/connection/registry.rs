//! Connection registry: the live handles of every connected user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tracing::info;

use sessionhub_core::types::id::{ConnectionId, SessionId, UserId};

use super::handle::ConnectionHandle;
use crate::message::ServerEvent;

/// Thread-safe map from user to that user's open connections.
///
/// Each user's handle list is replaced under its shard lock, so a
/// broadcast snapshot never sees a half-applied register or unregister.
/// The map itself is never handed out.
#[derive(Debug)]
pub struct ConnectionRegistry {
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    buffer_size: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry whose connections buffer `buffer_size` events.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            by_user: DashMap::new(),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Registers an authenticated connection.
    ///
    /// Returns the handle and the receiver the socket task drains.
    pub fn register(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, session_id, now, tx));

        self.by_user
            .entry(user_id)
            .or_default()
            .push(Arc::clone(&handle));

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            session_id = %session_id,
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Removes a connection and closes it. Returns whether it was present.
    pub fn unregister(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        let Entry::Occupied(mut entry) = self.by_user.entry(user_id) else {
            return false;
        };

        let handles = entry.get_mut();
        let before = handles.len();
        handles.retain(|h| {
            if h.id == conn_id {
                h.close();
                false
            } else {
                true
            }
        });
        let removed = handles.len() < before;
        if handles.is_empty() {
            entry.remove();
        }

        if removed {
            info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection unregistered");
        }
        removed
    }

    /// Copy of a user's handles for fan-out.
    pub(crate) fn snapshot(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Copy of every handle.
    pub(crate) fn snapshot_all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of open connections of one user.
    pub fn connections_for(&self, user_id: UserId) -> usize {
        self.by_user.get(&user_id).map_or(0, |entry| entry.len())
    }

    /// Total open connections.
    pub fn connection_count(&self) -> usize {
        self.by_user.iter().map(|entry| entry.len()).sum()
    }

    /// Number of users with at least one connection.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Closes and forgets every connection.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        self.by_user.retain(|_, handles| {
            for handle in handles.iter() {
                handle.close();
                closed += 1;
            }
            false
        });
        info!(count = closed, "Closed all WebSocket connections");
        closed
    }
}
