//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use sessionhub_core::types::id::{SessionId, UserId};

use super::device::DeviceInfo;

/// One logged-in device.
///
/// A session lives independently of the access token that created it: the
/// token may still verify while the session has already expired through
/// inactivity, and a refresh keeps pointing at the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Row identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// The `sid` claim of every access token issued for this device. Unique.
    pub session_id: SessionId,
    /// Parsed client fingerprint.
    #[sqlx(json)]
    pub device_info: DeviceInfo,
    /// Client address at login.
    pub ip_address: String,
    /// Login time. Eviction order is oldest `created_at` first.
    pub created_at: DateTime<Utc>,
    /// Last request that touched this session.
    pub last_activity: DateTime<Utc>,
    /// Sliding deadline, capped by the absolute lifetime.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is logically dead at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Seconds left before the sliding deadline, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Seconds since the last touch.
    pub fn idle_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity).num_seconds().max(0)
    }
}
