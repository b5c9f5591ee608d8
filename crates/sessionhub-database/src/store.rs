//! Store traits shared by the memory and PostgreSQL backends.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::session::Session;
use sessionhub_entity::token::RefreshToken;
use sessionhub_entity::user::User;

/// Parameters of one sliding-window touch.
#[derive(Debug, Clone, Copy)]
pub struct SessionTouch {
    /// Activity time.
    pub now: DateTime<Utc>,
    /// Sliding inactivity window.
    pub timeout: Duration,
    /// Absolute ceiling measured from `created_at`.
    pub lifetime: Duration,
}

impl SessionTouch {
    /// New deadline for a session created at `created_at`.
    pub fn deadline_for(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        let sliding = add_saturating(self.now, self.timeout);
        let ceiling = add_saturating(created_at, self.lifetime);
        sliding.min(ceiling)
    }
}

/// `at + duration`, clamped to the latest representable instant.
pub fn add_saturating(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Durable session rows.
///
/// Every method that removes rows returns the rows it removed, so callers
/// always broadcast from data captured before the delete.
#[async_trait]
pub trait SessionRepository: Send + Sync + fmt::Debug + 'static {
    /// Insert `session`, first deleting the oldest rows of the same user so
    /// that no more than `max_per_user` remain afterwards. Runs as one unit.
    ///
    /// Returns the evicted rows, oldest first.
    async fn insert_evicting(&self, session: &Session, max_per_user: u32)
    -> AppResult<Vec<Session>>;

    /// Look up a session by its shared identifier.
    async fn find(&self, session_id: SessionId) -> AppResult<Option<Session>>;

    /// All sessions of a user, oldest `created_at` first.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>>;

    /// Number of rows held for a user.
    async fn count_by_user(&self, user_id: UserId) -> AppResult<u64>;

    /// Slide the deadline of a session that still exists and has not expired.
    ///
    /// Returns `None` when the row is missing or already past its deadline.
    async fn touch_if_live(
        &self,
        session_id: SessionId,
        touch: SessionTouch,
    ) -> AppResult<Option<Session>>;

    /// Delete a session, returning the row as it was before deletion.
    async fn delete_returning(&self, session_id: SessionId) -> AppResult<Option<Session>>;

    /// Delete a session only if it belongs to `user_id`.
    async fn delete_for_user(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<Option<Session>>;

    /// Delete every session of `user_id` except `keep`.
    async fn delete_all_except(&self, user_id: UserId, keep: SessionId)
    -> AppResult<Vec<Session>>;

    /// Up to `limit` sessions whose deadline is before `now`, oldest deadline first.
    async fn find_expired(&self, now: DateTime<Utc>, limit: usize) -> AppResult<Vec<Session>>;

    /// Delete the given sessions if they are still expired at `now`.
    ///
    /// Rows already gone, or revived in between, are skipped silently.
    async fn delete_expired(
        &self,
        session_ids: &[SessionId],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>>;
}

/// Hashed refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + fmt::Debug + 'static {
    /// Persist a freshly issued token.
    async fn insert(&self, token: &RefreshToken) -> AppResult<()>;

    /// Look up a token by the digest of its secret.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Revoke one token if it is not yet revoked.
    ///
    /// Returns `true` only for the caller that performed the revocation, which
    /// makes rotation single-use under concurrency.
    async fn revoke_if_active(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every active token bound to a session. Returns how many changed.
    async fn revoke_for_session(&self, session_id: SessionId, now: DateTime<Utc>)
    -> AppResult<u64>;

    /// Drop rows whose absolute expiry has passed. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// User records consulted for identity and role.
#[async_trait]
pub trait UserRepository: Send + Sync + fmt::Debug + 'static {
    /// Find a user by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by (lowercased) email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: &User) -> AppResult<()>;
}
