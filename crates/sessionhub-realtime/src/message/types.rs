//! Inbound and outbound WebSocket message type definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessionhub_core::types::id::{SessionId, UserId};

/// Why a device is being told to drop its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceLogoutReason {
    /// One specific session was removed (user action or eviction).
    DeviceLogout,
    /// The user signed out everywhere except the initiating device.
    LogoutAllDevices,
    /// The sweeper removed sessions idle past their deadline.
    SessionExpired,
}

impl ForceLogoutReason {
    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceLogout => "device-logout",
            Self::LogoutAllDevices => "logout-all-devices",
            Self::SessionExpired => "session-expired",
        }
    }
}

impl fmt::Display for ForceLogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Handshake accepted.
    Authenticated {
        /// Connected user.
        user_id: UserId,
        /// Session the connection was opened with.
        session_id: SessionId,
    },
    /// Instruction to terminate the client-side session.
    ForceLogout {
        /// Cause.
        reason: ForceLogoutReason,
        /// Human-readable explanation.
        message: String,
        /// The single session being terminated, when targeted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// A session that must NOT act on this event.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclude_session_token: Option<SessionId>,
        /// Every session being terminated, for batched expiry.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        session_ids: Vec<SessionId>,
    },
    /// The user's session list changed; re-fetch it.
    SessionUpdate {},
    /// Keepalive.
    Heartbeat {
        /// Server time.
        timestamp: DateTime<Utc>,
    },
    /// Protocol or authentication error.
    Error {
        /// Machine code.
        code: String,
        /// Detail.
        message: String,
    },
}

impl ServerEvent {
    /// Targeted logout of one session.
    pub fn device_logout(session_id: SessionId, message: impl Into<String>) -> Self {
        Self::ForceLogout {
            reason: ForceLogoutReason::DeviceLogout,
            message: message.into(),
            session_id: Some(session_id),
            exclude_session_token: None,
            session_ids: Vec::new(),
        }
    }

    /// Logout of every session except `keep`.
    pub fn logout_all_devices(keep: SessionId) -> Self {
        Self::ForceLogout {
            reason: ForceLogoutReason::LogoutAllDevices,
            message: "You were signed out from another device.".to_string(),
            session_id: None,
            exclude_session_token: Some(keep),
            session_ids: Vec::new(),
        }
    }

    /// Expiry notice covering every session swept for one user.
    pub fn session_expired(session_ids: Vec<SessionId>) -> Self {
        Self::ForceLogout {
            reason: ForceLogoutReason::SessionExpired,
            message: "Your session has expired due to inactivity.".to_string(),
            session_id: None,
            exclude_session_token: None,
            session_ids,
        }
    }

    /// Stale-list hint.
    pub fn session_update() -> Self {
        Self::SessionUpdate {}
    }

    /// Keepalive at `now`.
    pub fn heartbeat(now: DateTime<Utc>) -> Self {
        Self::Heartbeat { timestamp: now }
    }

    /// Error frame.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Wire label of the event, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authenticated { .. } => "authenticated",
            Self::ForceLogout { .. } => "force-logout",
            Self::SessionUpdate {} => "session-update",
            Self::Heartbeat { .. } => "heartbeat",
            Self::Error { .. } => "error",
        }
    }

    /// Serializes the event to its JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// First-frame authentication when no `?token=` was given.
    Authenticate {
        /// Access token.
        token: String,
    },
    /// Heartbeat reply.
    Pong,
}
