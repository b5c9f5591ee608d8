//! In-memory session repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::session::Session;

use crate::store::{SessionRepository, SessionTouch};

/// Session rows keyed by their shared identifier.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionRepository {
    rows: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl MemorySessionRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert_evicting(
        &self,
        session: &Session,
        max_per_user: u32,
    ) -> AppResult<Vec<Session>> {
        let mut rows = self.rows.lock().await;

        let mut owned: Vec<Session> = rows
            .values()
            .filter(|s| s.user_id == session.user_id)
            .cloned()
            .collect();
        oldest_first(&mut owned);

        let keep = (max_per_user as usize).saturating_sub(1);
        let overflow = owned.len().saturating_sub(keep);
        let evicted: Vec<Session> = owned.into_iter().take(overflow).collect();
        for victim in &evicted {
            rows.remove(&victim.session_id);
        }

        rows.insert(session.session_id, session.clone());
        Ok(evicted)
    }

    async fn find(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        Ok(self.rows.lock().await.get(&session_id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        let rows = self.rows.lock().await;
        let mut owned: Vec<Session> = rows
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        oldest_first(&mut owned);
        Ok(owned)
    }

    async fn count_by_user(&self, user_id: UserId) -> AppResult<u64> {
        let rows = self.rows.lock().await;
        Ok(rows.values().filter(|s| s.user_id == user_id).count() as u64)
    }

    async fn touch_if_live(
        &self,
        session_id: SessionId,
        touch: SessionTouch,
    ) -> AppResult<Option<Session>> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(&session_id) else {
            return Ok(None);
        };
        if row.is_expired_at(touch.now) {
            return Ok(None);
        }
        row.last_activity = touch.now;
        row.expires_at = touch.deadline_for(row.created_at);
        Ok(Some(row.clone()))
    }

    async fn delete_returning(&self, session_id: SessionId) -> AppResult<Option<Session>> {
        Ok(self.rows.lock().await.remove(&session_id))
    }

    async fn delete_for_user(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<Option<Session>> {
        let mut rows = self.rows.lock().await;
        match rows.get(&session_id) {
            Some(row) if row.user_id == user_id => Ok(rows.remove(&session_id)),
            _ => Ok(None),
        }
    }

    async fn delete_all_except(
        &self,
        user_id: UserId,
        keep: SessionId,
    ) -> AppResult<Vec<Session>> {
        let mut rows = self.rows.lock().await;
        let doomed: Vec<SessionId> = rows
            .values()
            .filter(|s| s.user_id == user_id && s.session_id != keep)
            .map(|s| s.session_id)
            .collect();

        let mut deleted: Vec<Session> = doomed.iter().filter_map(|id| rows.remove(id)).collect();
        oldest_first(&mut deleted);
        Ok(deleted)
    }

    async fn find_expired(&self, now: DateTime<Utc>, limit: usize) -> AppResult<Vec<Session>> {
        let rows = self.rows.lock().await;
        let mut expired: Vec<Session> = rows
            .values()
            .filter(|s| s.expires_at < now)
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.expires_at);
        expired.truncate(limit);
        Ok(expired)
    }

    async fn delete_expired(
        &self,
        session_ids: &[SessionId],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let mut rows = self.rows.lock().await;
        let mut deleted = Vec::with_capacity(session_ids.len());
        for id in session_ids {
            if rows.get(id).is_some_and(|s| s.expires_at < now) {
                if let Some(row) = rows.remove(id) {
                    deleted.push(row);
                }
            }
        }
        Ok(deleted)
    }
}
