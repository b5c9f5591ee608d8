//! Individual WebSocket connection handle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sessionhub_core::types::id::{ConnectionId, SessionId, UserId};

use crate::message::ServerEvent;

/// A handle to a single authenticated WebSocket connection.
///
/// The socket task owns the receiving half of `sender`; the handle only
/// pushes events and signals closure through `closed`.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Session whose token opened the connection.
    pub session_id: SessionId,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<ServerEvent>,
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        connected_at: DateTime<Utc>,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            session_id,
            connected_at,
            sender,
            closed: CancellationToken::new(),
        }
    }

    /// Push an event, waiting at most `timeout` for buffer space.
    ///
    /// Returns `false` when the peer is gone or too slow; the handle is then
    /// marked closed.
    pub async fn send(&self, event: ServerEvent, timeout: Duration) -> bool {
        if !self.is_alive() {
            return false;
        }
        match tokio::time::timeout(timeout, self.sender.send(event)).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                debug!(conn_id = %self.id, "Connection receiver dropped");
                self.close();
                false
            }
            Err(_) => {
                warn!(
                    conn_id = %self.id,
                    user_id = %self.user_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Send timed out, dropping connection"
                );
                self.close();
                false
            }
        }
    }

    /// Whether the connection is still open.
    pub fn is_alive(&self) -> bool {
        !self.closed.is_cancelled() && !self.sender.is_closed()
    }

    /// Signal the socket task to shut the connection.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Resolves once [`ConnectionHandle::close`] has been called.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }
}
