//! Per-request composition: rate limit, verify token, check and touch
//! the session, then gate on role.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::user::UserRole;

use crate::rate_limit::{OperationClass, RateLimitKey, RateLimiter};
use crate::rbac::RoleRequirement;
use crate::session::SessionStore;
use crate::token::TokenService;

/// Identity established by [`RequestPipeline::authenticate`] and passed to
/// everything downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    /// Authenticated user.
    pub user_id: UserId,
    /// Email at token issuance.
    pub email: String,
    /// Role at token issuance.
    pub role: UserRole,
    /// Session the presented token belongs to.
    pub session_id: SessionId,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The request-handling backbone every protected operation goes through.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    tokens: Arc<TokenService>,
    sessions: Arc<SessionStore>,
    limiter: Arc<RateLimiter>,
}

impl RequestPipeline {
    /// Creates a new pipeline.
    pub fn new(
        tokens: Arc<TokenService>,
        sessions: Arc<SessionStore>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            tokens,
            sessions,
            limiter,
        }
    }

    /// Verifies the token, rejects logically expired sessions and records activity.
    ///
    /// A cryptographically valid token whose session is gone or idle past its
    /// deadline fails with `SessionExpired`, never succeeds.
    pub async fn authenticate(&self, raw_token: Option<&str>) -> AppResult<AuthContext> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::no_token("Authentication token required"))?;

        let claims = self.tokens.verify_access(token)?;
        let session_id = claims.session_id();

        if self.sessions.is_expired(session_id).await? {
            debug!(
                user_id = %claims.sub,
                session_id = %session_id,
                "Rejected token for expired session"
            );
            return Err(AppError::session_expired());
        }

        self.sessions.touch(session_id).await?;

        Ok(AuthContext {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            session_id,
        })
    }

    /// Identity for rate-limit keying: verifies the token only, without
    /// touching the session.
    pub fn identify(&self, raw_token: Option<&str>) -> Option<UserId> {
        let token = raw_token?;
        self.tokens.verify_access(token).ok().map(|claims| claims.sub)
    }

    /// Fails with `RateLimited` when the caller's budget for `class` is spent.
    pub fn rate_limit(&self, key: &RateLimitKey, class: OperationClass) -> AppResult<()> {
        self.limiter.check(key, class)
    }

    /// Charges a failed operation to a failures-only budget.
    pub fn record_failure(&self, key: &RateLimitKey, class: OperationClass) {
        self.limiter.record_failure(key, class);
    }

    /// Role gate.
    pub fn authorize(&self, role: UserRole, required: RoleRequirement) -> AppResult<()> {
        required.authorize(role)
    }
}
