//! Refresh session repository implementation.

use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use tenantauth_core::result::AppResult;
use tenantauth_entity::refresh_session::{
    NewRefreshSession, RefreshSession, RotationOutcome, SessionState, Successor,
};

use crate::error::map_sqlx_error;

/// Repository for the append-only `refresh_sessions` ledger.
#[derive(Debug, Clone)]
pub struct RefreshSessionRepository {
    pool: PgPool,
}

impl RefreshSessionRepository {
    /// Create a new refresh session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session row.
    pub async fn create(&self, data: &NewRefreshSession) -> AppResult<RefreshSession> {
        sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (id, user_id, token_hash, user_agent, client_ip, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(&data.user_agent)
        .bind(&data.client_ip)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_refresh_session", e))
    }

    /// Find a session by token digest.
    pub async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>("SELECT * FROM refresh_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_refresh_session_by_hash", e))
    }

    /// Follow `replaced_by` links starting at the row with `token_hash`.
    ///
    /// Returns the rows oldest first; empty if the digest is unknown.
    pub async fn find_chain(&self, token_hash: &str) -> AppResult<Vec<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(
            "WITH RECURSIVE chain AS ( \
                SELECT s.*, 0 AS depth FROM refresh_sessions s WHERE s.token_hash = $1 \
                UNION ALL \
                SELECT r.*, c.depth + 1 FROM refresh_sessions r \
                JOIN chain c ON r.id = c.replaced_by \
             ) SELECT * FROM chain ORDER BY depth",
        )
        .bind(token_hash)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_refresh_session_chain", e))
    }

    /// Consume the row with `old_hash` and insert `successor` in one transaction.
    ///
    /// The predecessor row is locked with `FOR UPDATE`, so concurrent
    /// rotations of the same token serialize and the loser observes
    /// `Revoked`. Any error, or dropping the returned future, before the
    /// commit rolls the transaction back and leaves the old row untouched.
    pub async fn rotate(&self, old_hash: &str, successor: &Successor) -> AppResult<RotationOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("rotate_begin", e))?;

        let current = sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions WHERE token_hash = $1 FOR UPDATE",
        )
        .bind(old_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("rotate_lock", e))?;

        let Some(current) = current else {
            return Ok(RotationOutcome::NotFound);
        };

        match current.state_at(Utc::now()) {
            SessionState::Rotated | SessionState::Revoked => {
                debug!(session_id = %current.id, "Rotation refused: session already revoked");
                return Ok(RotationOutcome::Revoked);
            }
            SessionState::Expired => return Ok(RotationOutcome::Expired),
            SessionState::Active => {}
        }

        let inserted = sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (id, user_id, token_hash, user_agent, client_ip, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(successor.id)
        .bind(current.user_id)
        .bind(&successor.token_hash)
        .bind(&current.user_agent)
        .bind(&current.client_ip)
        .bind(successor.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("rotate_insert", e))?;

        sqlx::query("UPDATE refresh_sessions SET revoked_at = NOW(), replaced_by = $2 WHERE id = $1")
            .bind(current.id)
            .bind(inserted.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("rotate_consume", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("rotate_commit", e))?;

        Ok(RotationOutcome::Rotated {
            predecessor: current,
            successor: inserted,
        })
    }

    /// Revoke the row with `token_hash` if it is not already revoked.
    ///
    /// Returns whether a row changed.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() \
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_refresh_session", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session of a user in one statement.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_all_refresh_sessions", e))?;
        Ok(result.rows_affected())
    }

    /// Sessions of a user that can still be exchanged, newest first.
    pub async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > NOW() \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_active_refresh_sessions", e))
    }
}
