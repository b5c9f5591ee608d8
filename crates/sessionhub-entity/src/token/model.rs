//! Refresh token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use sessionhub_core::types::id::{SessionId, UserId};

/// A persisted refresh token. Only the SHA-256 digest of the secret is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Row identifier.
    pub id: Uuid,
    /// Owner.
    pub user_id: UserId,
    /// Session the token keeps alive. Reused by every rotation.
    pub session_id: SessionId,
    /// Hex SHA-256 of the opaque token string.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Set once on rotation, logout or eviction.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether the token is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
