//! Token service: issue, verify, rotate and revoke.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sessionhub_core::config::auth::AuthConfig;
use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_database::store::{RefreshTokenRepository, UserRepository, add_saturating};
use sessionhub_entity::token::RefreshToken;
use sessionhub_entity::user::UserRole;

use super::opaque::{generate_refresh_secret, hash_refresh_secret};
use crate::jwt::{Claims, JwtDecoder, JwtEncoder};

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTokens {
    /// Signed access token.
    pub access_token: String,
    /// When the access token stops verifying.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque single-use refresh secret.
    pub refresh_token: String,
    /// When the refresh secret stops being accepted.
    pub refresh_expires_at: DateTime<Utc>,
    /// Session both tokens are bound to.
    pub session_id: SessionId,
}

/// Issues and verifies credentials.
///
/// Holds no mutable state of its own: refresh tokens live hashed in the
/// repository, which doubles as the revocation list.
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    refresh_ttl: Duration,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenService {
    /// Creates a new token service.
    pub fn new(
        config: &AuthConfig,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            refresh_ttl: config.refresh_token_ttl,
            refresh_tokens,
            users,
            clock,
        }
    }

    /// Issues a pair bound to a brand-new session id.
    ///
    /// The caller must create the matching session row.
    pub async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
    ) -> AppResult<IssuedTokens> {
        let session_id = SessionId::new();
        let tokens = self.issue_for_session(user_id, email, role, session_id).await?;
        debug!(user_id = %user_id, session_id = %session_id, "Issued token pair");
        Ok(tokens)
    }

    /// Verifies signature and expiry of an access token.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.decoder.decode_access(token, self.clock.now())
    }

    /// Rotates a refresh token.
    ///
    /// The presented token is revoked and a new pair is issued for the same
    /// session, so a refresh never creates a session or counts against the cap.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<IssuedTokens> {
        let now = self.clock.now();
        let hash = hash_refresh_secret(refresh_token);

        let stored = self
            .refresh_tokens
            .find_by_hash(&hash)
            .await?
            .ok_or_else(|| AppError::not_found("Refresh token not recognised"))?;

        if stored.is_revoked() {
            warn!(
                user_id = %stored.user_id,
                session_id = %stored.session_id,
                "Revoked refresh token presented"
            );
            return Err(AppError::token_revoked("Refresh token has already been used"));
        }
        if stored.is_expired_at(now) {
            return Err(AppError::token_expired("Refresh token has expired"));
        }

        // Whoever flips revoked_at wins the rotation; a concurrent loser sees it as reuse.
        if !self.refresh_tokens.revoke_if_active(stored.id, now).await? {
            return Err(AppError::token_revoked("Refresh token has already been used"));
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or_else(|| AppError::invalid_token("Token owner no longer exists"))?;

        let tokens = self
            .issue_for_session(user.id, &user.email, user.role, stored.session_id)
            .await?;
        info!(user_id = %user.id, session_id = %stored.session_id, "Rotated refresh token");
        Ok(tokens)
    }

    /// Revokes a refresh token. Unknown or already revoked tokens are fine.
    pub async fn revoke(&self, refresh_token: &str) -> AppResult<()> {
        let hash = hash_refresh_secret(refresh_token);
        if let Some(stored) = self.refresh_tokens.find_by_hash(&hash).await? {
            self.refresh_tokens
                .revoke_if_active(stored.id, self.clock.now())
                .await?;
        }
        Ok(())
    }

    /// Revokes every refresh token bound to a session.
    pub async fn revoke_session(&self, session_id: SessionId) -> AppResult<u64> {
        let revoked = self
            .refresh_tokens
            .revoke_for_session(session_id, self.clock.now())
            .await?;
        if revoked > 0 {
            debug!(session_id = %session_id, revoked, "Revoked session refresh tokens");
        }
        Ok(revoked)
    }

    /// Deletes refresh-token rows past their absolute expiry.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.refresh_tokens.purge_expired(self.clock.now()).await
    }

    async fn issue_for_session(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        session_id: SessionId,
    ) -> AppResult<IssuedTokens> {
        let now = self.clock.now();
        let (access_token, access_expires_at) =
            self.encoder
                .encode_access(user_id, email, role, session_id, now)?;

        let refresh_token = generate_refresh_secret();
        let refresh_expires_at = add_saturating(now, self.refresh_ttl);
        self.refresh_tokens
            .insert(&RefreshToken {
                id: Uuid::new_v4(),
                user_id,
                session_id,
                token_hash: hash_refresh_secret(&refresh_token),
                expires_at: refresh_expires_at,
                revoked_at: None,
                created_at: now,
            })
            .await?;

        Ok(IssuedTokens {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            session_id,
        })
    }
}
