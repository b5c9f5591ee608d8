//! Session store.
//!
//! Wraps a [`SessionRepository`] with the lifecycle rules: the per-user
//! cap is enforced on create, deadlines slide on touch but never past the
//! absolute lifetime, and every delete hands back the row it removed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use sessionhub_core::config::session::SessionConfig;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_database::store::{SessionRepository, SessionTouch, add_saturating};
use sessionhub_entity::session::{DeviceInfo, Session};

/// Outcome of [`SessionStore::create`].
#[derive(Debug, Clone)]
pub struct CreatedSession {
    /// The inserted row.
    pub session: Session,
    /// Rows removed to stay under the per-user cap, oldest first.
    pub evicted: Vec<Session>,
}

/// Lifecycle rules over the session repository.
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    lifetime: Duration,
    max_per_user: u32,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("timeout", &self.timeout)
            .field("lifetime", &self.lifetime)
            .field("max_per_user", &self.max_per_user)
            .finish()
    }
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(
        config: &SessionConfig,
        repo: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            clock,
            timeout: config.timeout,
            lifetime: config.lifetime,
            max_per_user: config.max_per_user.max(1),
        }
    }

    /// Inserts a session for `session_id`, evicting the oldest one of the
    /// same user first when the cap is reached. Eviction and insert are one unit.
    pub async fn create(
        &self,
        user_id: UserId,
        device_info: DeviceInfo,
        ip_address: &str,
        session_id: SessionId,
    ) -> AppResult<CreatedSession> {
        let now = self.clock.now();
        let sliding = add_saturating(now, self.timeout);
        let ceiling = add_saturating(now, self.lifetime);

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            device_info,
            ip_address: ip_address.to_string(),
            created_at: now,
            last_activity: now,
            expires_at: sliding.min(ceiling),
        };

        let evicted = self
            .repo
            .insert_evicting(&session, self.max_per_user)
            .await?;

        for victim in &evicted {
            info!(
                user_id = %user_id,
                evicted_session = %victim.session_id,
                "Evicted oldest session to stay under the per-user limit"
            );
        }

        Ok(CreatedSession { session, evicted })
    }

    /// Looks up a session.
    pub async fn get(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        self.repo.find(session_id).await
    }

    /// Sessions of a user, oldest first.
    pub async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        self.repo.list_by_user(user_id).await
    }

    /// Number of sessions a user holds.
    pub async fn count_by_user(&self, user_id: UserId) -> AppResult<u64> {
        self.repo.count_by_user(user_id).await
    }

    /// Records activity and slides the deadline.
    ///
    /// Returns `None` without error when the session is gone or already
    /// expired; an expired session is never revived.
    pub async fn touch(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        let touch = SessionTouch {
            now: self.clock.now(),
            timeout: self.timeout,
            lifetime: self.lifetime,
        };
        let touched = self.repo.touch_if_live(session_id, touch).await?;
        if touched.is_none() {
            debug!(session_id = %session_id, "Touch skipped for missing or expired session");
        }
        Ok(touched)
    }

    /// Deletes a session and returns the row it had before deletion.
    pub async fn delete(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        self.repo.delete_returning(session_id).await
    }

    /// Deletes a session only if `user_id` owns it.
    pub async fn delete_owned(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<Option<Session>> {
        self.repo.delete_for_user(user_id, session_id).await
    }

    /// Deletes every session of `user_id` except `current`, returning the deleted rows.
    pub async fn delete_all_except_current(
        &self,
        user_id: UserId,
        current: SessionId,
    ) -> AppResult<Vec<Session>> {
        self.repo.delete_all_except(user_id, current).await
    }

    /// `true` when the session is missing or past its deadline.
    pub async fn is_expired(&self, session_id: SessionId) -> AppResult<bool> {
        let now = self.clock.now();
        Ok(self
            .repo
            .find(session_id)
            .await?
            .is_none_or(|session| session.is_expired_at(now)))
    }

    /// Up to `limit` sessions past their deadline right now.
    pub async fn find_expired(&self, limit: usize) -> AppResult<Vec<Session>> {
        self.repo.find_expired(self.clock.now(), limit).await
    }

    /// Deletes the given sessions if they are still expired. Returns the rows removed.
    pub async fn delete_expired(&self, session_ids: &[SessionId]) -> AppResult<Vec<Session>> {
        self.repo.delete_expired(session_ids, self.clock.now()).await
    }
}
