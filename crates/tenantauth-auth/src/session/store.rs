//! Refresh session persistence.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tenantauth_core::result::AppResult;
use tenantauth_database::repositories::RefreshSessionRepository;
use tenantauth_entity::refresh_session::{
    NewRefreshSession, RefreshSession, RotationOutcome, Successor,
};

/// Storage for refresh session rows.
///
/// `rotate` must be atomic: it either consumes the predecessor and inserts
/// the successor, or changes nothing. Concurrent rotations of the same
/// digest must serialize so that exactly one succeeds.
#[async_trait]
pub trait RefreshSessionStore: Send + Sync + std::fmt::Debug {
    /// Insert a new active session.
    async fn insert(&self, data: NewRefreshSession) -> AppResult<RefreshSession>;

    /// Find a session by token digest.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>>;

    /// Rows reachable from `token_hash` through `replaced_by`, oldest first.
    async fn chain(&self, token_hash: &str) -> AppResult<Vec<RefreshSession>>;

    /// Consume the row with `old_hash` and insert `successor`.
    async fn rotate(&self, old_hash: &str, successor: Successor) -> AppResult<RotationOutcome>;

    /// Revoke one session. Returns whether a row changed.
    async fn revoke(&self, token_hash: &str) -> AppResult<bool>;

    /// Revoke every active session of a user. Returns the number revoked.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;
}

/// Postgres-backed session store.
#[derive(Debug, Clone)]
pub struct PgRefreshSessionStore {
    repo: RefreshSessionRepository,
}

impl PgRefreshSessionStore {
    /// Creates a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: RefreshSessionRepository::new(pool),
        }
    }
}

#[async_trait]
impl RefreshSessionStore for PgRefreshSessionStore {
    async fn insert(&self, data: NewRefreshSession) -> AppResult<RefreshSession> {
        self.repo.create(&data).await
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        self.repo.find_by_hash(token_hash).await
    }

    async fn chain(&self, token_hash: &str) -> AppResult<Vec<RefreshSession>> {
        self.repo.find_chain(token_hash).await
    }

    async fn rotate(&self, old_hash: &str, successor: Successor) -> AppResult<RotationOutcome> {
        self.repo.rotate(old_hash, &successor).await
    }

    async fn revoke(&self, token_hash: &str) -> AppResult<bool> {
        self.repo.revoke_by_hash(token_hash).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.repo.revoke_all_for_user(user_id).await
    }
}
