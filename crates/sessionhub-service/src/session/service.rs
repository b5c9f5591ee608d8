//! Listing, revoking and inspecting the caller's own sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use sessionhub_auth::{AuthContext, SessionStore, TokenService};
use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::SessionId;
use sessionhub_entity::session::{DeviceInfo, Session};
use sessionhub_realtime::BroadcastDispatcher;

const REVOKED_MESSAGE: &str = "This device was signed out from another device.";

/// One session as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Shared session identifier.
    pub id: SessionId,
    /// Parsed client fingerprint.
    pub device_info: DeviceInfo,
    /// Address at login.
    pub ip_address: String,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last touch.
    pub last_activity: DateTime<Utc>,
    /// Sliding deadline.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session making the request.
    pub current: bool,
}

impl SessionView {
    fn from_session(session: Session, current: SessionId) -> Self {
        Self {
            id: session.session_id,
            current: session.session_id == current,
            device_info: session.device_info,
            ip_address: session.ip_address,
            created_at: session.created_at,
            last_activity: session.last_activity,
            expires_at: session.expires_at,
        }
    }
}

/// Remaining lifetime of the caller's session, for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    /// Session identifier.
    pub session_id: SessionId,
    /// Current deadline.
    pub expires_at: DateTime<Utc>,
    /// Seconds until the deadline.
    pub remaining_seconds: i64,
    /// Seconds since the previous touch.
    pub idle_seconds: i64,
}

/// Session management on behalf of an authenticated user.
pub struct SessionService {
    sessions: Arc<SessionStore>,
    tokens: Arc<TokenService>,
    dispatcher: Arc<BroadcastDispatcher>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService").finish()
    }
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(
        sessions: Arc<SessionStore>,
        tokens: Arc<TokenService>,
        dispatcher: Arc<BroadcastDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            dispatcher,
            clock,
        }
    }

    /// The caller's sessions, oldest first, with the current one flagged.
    pub async fn list(&self, ctx: &AuthContext) -> AppResult<Vec<SessionView>> {
        let rows = self.sessions.list_by_user(ctx.user_id).await?;
        Ok(rows
            .into_iter()
            .map(|s| SessionView::from_session(s, ctx.session_id))
            .collect())
    }

    /// Signs out one of the caller's sessions.
    ///
    /// A session that is already gone, or that belongs to someone else,
    /// yields `Ok(None)`.
    pub async fn delete_one(
        &self,
        ctx: &AuthContext,
        session_id: SessionId,
    ) -> AppResult<Option<SessionView>> {
        let Some(removed) = self.sessions.delete_owned(ctx.user_id, session_id).await? else {
            return Ok(None);
        };

        self.revoke_tokens(removed.session_id).await;
        self.dispatcher
            .device_logout(ctx.user_id, removed.session_id, REVOKED_MESSAGE)
            .await;
        self.dispatcher.session_update(ctx.user_id).await;

        info!(
            user_id = %ctx.user_id,
            session_id = %removed.session_id,
            "Session revoked by owner"
        );
        Ok(Some(SessionView::from_session(removed, ctx.session_id)))
    }

    /// Signs out every session of the caller except the current one.
    pub async fn delete_all_except_current(&self, ctx: &AuthContext) -> AppResult<Vec<SessionView>> {
        let removed = self
            .sessions
            .delete_all_except_current(ctx.user_id, ctx.session_id)
            .await?;
        if removed.is_empty() {
            return Ok(Vec::new());
        }

        for session in &removed {
            self.revoke_tokens(session.session_id).await;
        }
        self.dispatcher
            .logout_all_devices(ctx.user_id, ctx.session_id)
            .await;
        self.dispatcher.session_update(ctx.user_id).await;

        info!(
            user_id = %ctx.user_id,
            kept = %ctx.session_id,
            count = removed.len(),
            "Signed out all other devices"
        );
        Ok(removed
            .into_iter()
            .map(|s| SessionView::from_session(s, ctx.session_id))
            .collect())
    }

    /// Deadline information for the caller's session.
    pub async fn status(&self, ctx: &AuthContext) -> AppResult<SessionStatus> {
        let now = self.clock.now();
        let session = self
            .sessions
            .get(ctx.session_id)
            .await?
            .filter(|s| !s.is_expired_at(now))
            .ok_or_else(AppError::session_expired)?;

        Ok(SessionStatus {
            session_id: session.session_id,
            expires_at: session.expires_at,
            remaining_seconds: session.remaining_seconds(now),
            idle_seconds: session.idle_seconds(now),
        })
    }

    async fn revoke_tokens(&self, session_id: SessionId) {
        if let Err(e) = self.tokens.revoke_session(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to revoke session tokens");
        }
    }
}
