//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::types::id::UserId;
use sessionhub_entity::user::User;

use super::db_err;
use crate::store::UserRepository;

const COLUMNS: &str = "id, email, password_hash, role, created_at";

/// Repository for user credential rows.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user"))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user by email"))
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                AppError::conflict(format!(
                    "An account with email '{}' already exists",
                    user.email
                ))
            } else {
                db_err("Failed to create user")(e)
            }
        })?;
        Ok(())
    }
}
