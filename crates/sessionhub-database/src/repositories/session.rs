//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::session::Session;

use super::db_err;
use crate::store::{SessionRepository, SessionTouch};

const COLUMNS: &str =
    "id, user_id, session_id, device_info, ip_address, created_at, last_activity, expires_at";

/// Repository for session rows.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_ids_to_uuids(ids: &[SessionId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert_evicting(
        &self,
        session: &Session,
        max_per_user: u32,
    ) -> AppResult<Vec<Session>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to open session transaction"))?;

        // Serializes concurrent logins of one user for the rest of the transaction.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(session.user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to lock user sessions"))?;

        let keep = i64::from(max_per_user.saturating_sub(1));
        let query = format!(
            "DELETE FROM sessions WHERE id IN ( \
                 SELECT id FROM sessions WHERE user_id = $1 \
                 ORDER BY created_at DESC, id DESC OFFSET $2 \
             ) RETURNING {COLUMNS}"
        );
        let mut evicted = sqlx::query_as::<_, Session>(&query)
            .bind(session.user_id)
            .bind(keep)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to evict oldest sessions"))?;

        sqlx::query(
            "INSERT INTO sessions \
             (id, user_id, session_id, device_info, ip_address, created_at, last_activity, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.session_id)
        .bind(Json(&session.device_info))
        .bind(&session.ip_address)
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to insert session"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit session insert"))?;

        evicted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(evicted)
    }

    async fn find(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE session_id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find session"))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list sessions"))
    }

    async fn count_by_user(&self, user_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count sessions"))?;
        Ok(count.max(0) as u64)
    }

    async fn touch_if_live(
        &self,
        session_id: SessionId,
        touch: SessionTouch,
    ) -> AppResult<Option<Session>> {
        let query = format!(
            "UPDATE sessions SET last_activity = $2, \
                 expires_at = LEAST($2 + make_interval(secs => $3), created_at + make_interval(secs => $4)) \
             WHERE session_id = $1 AND expires_at >= $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(touch.now)
            .bind(touch.timeout.as_secs_f64())
            .bind(touch.lifetime.as_secs_f64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to touch session"))
    }

    async fn delete_returning(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        let query = format!("DELETE FROM sessions WHERE session_id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to delete session"))
    }

    async fn delete_for_user(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<Option<Session>> {
        let query = format!(
            "DELETE FROM sessions WHERE session_id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to delete session"))
    }

    async fn delete_all_except(
        &self,
        user_id: UserId,
        keep: SessionId,
    ) -> AppResult<Vec<Session>> {
        let query = format!(
            "DELETE FROM sessions WHERE user_id = $1 AND session_id <> $2 RETURNING {COLUMNS}"
        );
        let mut deleted = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(keep)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to delete other sessions"))?;
        deleted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(deleted)
    }

    async fn find_expired(&self, now: DateTime<Utc>, limit: usize) -> AppResult<Vec<Session>> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE expires_at < $1 ORDER BY expires_at ASC LIMIT $2"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(now)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to find expired sessions"))
    }

    async fn delete_expired(
        &self,
        session_ids: &[SessionId],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "DELETE FROM sessions WHERE session_id = ANY($1) AND expires_at < $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_ids_to_uuids(session_ids))
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to delete expired sessions"))
    }
}
