//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessionhub_auth::IssuedTokens;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::user::{User, UserRole};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration.
    pub refresh_expires_at: DateTime<Utc>,
    /// Session both tokens belong to.
    pub session_id: SessionId,
}

impl From<IssuedTokens> for TokenResponse {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
            session_id: tokens.session_id,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Issued credentials.
    #[serde(flatten)]
    pub tokens: TokenResponse,
    /// Sessions removed to stay under the per-user cap.
    pub evicted_sessions: Vec<SessionId>,
    /// User info.
    pub user: UserResponse,
}

/// User summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: UserId,
    /// Email.
    pub email: String,
    /// Role.
    pub role: UserRole,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Account export, available on the paid tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountExportResponse {
    /// The account.
    pub user: UserResponse,
    /// Number of signed-in devices.
    pub active_sessions: usize,
    /// When the export was produced.
    pub exported_at: DateTime<Utc>,
}

/// Result of a bulk or single session deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedSessionsResponse {
    /// Sessions that were actually removed.
    pub deleted: Vec<SessionId>,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Persistence backend in use.
    pub database: String,
    /// Open WebSocket connections.
    pub ws_connections: usize,
    /// Users with at least one open connection.
    pub online_users: usize,
}
