//! In-memory user repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::UserId;
use sessionhub_entity::user::User;

use crate::store::UserRepository;

/// Users keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    rows: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        if rows.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::conflict(format!(
                "An account with email '{}' already exists",
                user.email
            )));
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }
}
