//! Authentication flows: signup, login, refresh, logout.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use sessionhub_auth::{AuthContext, IssuedTokens, PasswordHasher, SessionStore, TokenService};
use sessionhub_core::config::auth::AuthConfig;
use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_database::store::UserRepository;
use sessionhub_entity::session::Session;
use sessionhub_entity::user::{User, UserRole};
use sessionhub_realtime::BroadcastDispatcher;

use crate::context::ClientInfo;

const EVICTED_MESSAGE: &str =
    "You were signed out because your account signed in on a new device.";

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    /// The signed-in account.
    pub user: User,
    /// Credentials for the new session.
    pub tokens: IssuedTokens,
    /// The session row just created.
    pub session: Session,
    /// Sessions evicted to honour the per-user cap.
    pub evicted: Vec<SessionId>,
}

/// Credential checks and session creation.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    sessions: Arc<SessionStore>,
    dispatcher: Arc<BroadcastDispatcher>,
    clock: Arc<dyn Clock>,
    password_min_length: usize,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("password_min_length", &self.password_min_length)
            .finish()
    }
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        sessions: Arc<SessionStore>,
        dispatcher: Arc<BroadcastDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            tokens,
            sessions,
            dispatcher,
            clock,
            password_min_length: config.password_min_length,
        }
    }

    /// Registers a new `STARTER` account.
    pub async fn signup(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email)?;
        if password.chars().count() < self.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                self.password_min_length
            )));
        }

        let password_hash = self.hasher.hash_async(password.to_string()).await?;
        let user = User {
            id: UserId::new(),
            email,
            password_hash,
            role: UserRole::Starter,
            created_at: self.clock.now(),
        };
        self.users.create(&user).await?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Verifies credentials, issues tokens and creates the device session.
    ///
    /// If the per-user cap forces an eviction, the evicted device is told to
    /// log out and its refresh tokens stop working.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AppResult<LoginOutcome> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        let valid = self
            .hasher
            .verify_async(password.to_string(), user.password_hash.clone())
            .await?;
        if !valid {
            warn!(user_id = %user.id, ip = %client.ip_address, "Login with wrong password");
            return Err(AppError::invalid_credentials());
        }

        let tokens = self.tokens.issue(user.id, &user.email, user.role).await?;
        let created = match self
            .sessions
            .create(
                user.id,
                client.device_info(),
                &client.ip_address,
                tokens.session_id,
            )
            .await
        {
            Ok(created) => created,
            Err(e) => {
                // Tokens without a session row must not outlive the failure.
                if let Err(revoke_err) = self.tokens.revoke_session(tokens.session_id).await {
                    warn!(error = %revoke_err, "Failed to revoke tokens of aborted login");
                }
                return Err(e);
            }
        };

        let mut evicted = Vec::with_capacity(created.evicted.len());
        for victim in &created.evicted {
            self.revoke_quietly(victim.session_id).await;
            self.dispatcher
                .device_logout(user.id, victim.session_id, EVICTED_MESSAGE)
                .await;
            evicted.push(victim.session_id);
        }
        self.dispatcher.session_update(user.id).await;

        info!(
            user_id = %user.id,
            session_id = %tokens.session_id,
            evicted = evicted.len(),
            "User logged in"
        );

        Ok(LoginOutcome {
            user,
            tokens,
            session: created.session,
            evicted,
        })
    }

    /// Rotates a refresh token for a session that is still live.
    ///
    /// When the session is gone or expired the rotated pair is revoked at
    /// once and the caller gets `SessionExpired`.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<IssuedTokens> {
        let tokens = self.tokens.refresh(refresh_token).await?;

        if self.sessions.touch(tokens.session_id).await?.is_none() {
            self.revoke_quietly(tokens.session_id).await;
            info!(session_id = %tokens.session_id, "Refresh refused for expired session");
            return Err(AppError::session_expired());
        }

        Ok(tokens)
    }

    /// Ends the caller's own session.
    pub async fn logout(&self, ctx: &AuthContext) -> AppResult<()> {
        let removed = self.sessions.delete(ctx.session_id).await?;
        self.tokens.revoke_session(ctx.session_id).await?;

        if removed.is_some() {
            self.dispatcher.session_update(ctx.user_id).await;
        }

        info!(user_id = %ctx.user_id, session_id = %ctx.session_id, "User logged out");
        Ok(())
    }

    /// The caller's account record.
    pub async fn account(&self, ctx: &AuthContext) -> AppResult<User> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))
    }

    async fn revoke_quietly(&self, session_id: SessionId) {
        if let Err(e) = self.tokens.revoke_session(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to revoke session tokens");
        }
    }
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::validation("A valid email address is required"));
    }
    Ok(email)
}
