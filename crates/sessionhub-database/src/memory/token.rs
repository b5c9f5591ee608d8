//! In-memory refresh token repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::SessionId;
use sessionhub_entity::token::RefreshToken;

use crate::store::RefreshTokenRepository;

/// Refresh tokens keyed by row id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshTokenRepository {
    rows: Arc<Mutex<HashMap<Uuid, RefreshToken>>>,
}

impl MemoryRefreshTokenRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> AppResult<()> {
        self.rows.lock().await.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let rows = self.rows.lock().await;
        Ok(rows.values().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn revoke_if_active(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&id) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_for_session(
        &self,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        let mut changed = 0;
        for token in rows
            .values_mut()
            .filter(|t| t.session_id == session_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, t| !t.is_expired_at(now));
        Ok((before - rows.len()) as u64)
    }
}
