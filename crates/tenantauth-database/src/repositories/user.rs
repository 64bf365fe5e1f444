//! `users` table access.

use sqlx::PgPool;
use uuid::Uuid;

use tenantauth_core::error::{AppError, ErrorKind};
use tenantauth_core::result::AppResult;
use tenantauth_entity::user::{NewUser, User, UserStatus};

use crate::error::{is_unique_violation, map_sqlx_error};

/// Credential records keyed by normalised email.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exact match on the stored (lower-cased) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))
    }

    /// Inserts an active user. A taken email is a `Conflict`.
    pub async fn create(&self, data: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::with_source(
                    ErrorKind::Conflict,
                    format!("Email '{}' is already registered", data.email),
                    e,
                )
            } else {
                map_sqlx_error("create_user", e)
            }
        })
    }

    /// Returns `false` when no user has this id.
    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<bool> {
        let done = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_status", e))?;
        Ok(done.rows_affected() == 1)
    }
}
