//! In-memory refresh session store using a Tokio mutex around the table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_entity::refresh_session::{
    NewRefreshSession, RefreshSession, RotationOutcome, SessionState, Successor,
};

use super::store::RefreshSessionStore;

#[derive(Debug, Default)]
struct InnerState {
    rows: HashMap<Uuid, RefreshSession>,
    by_hash: HashMap<String, Uuid>,
}

impl InnerState {
    fn get_by_hash(&self, token_hash: &str) -> Option<&RefreshSession> {
        self.by_hash.get(token_hash).and_then(|id| self.rows.get(id))
    }

    fn insert(&mut self, session: RefreshSession) -> AppResult<()> {
        if self.by_hash.contains_key(&session.token_hash) {
            return Err(AppError::conflict("Refresh token digest already exists"));
        }
        self.by_hash.insert(session.token_hash.clone(), session.id);
        self.rows.insert(session.id, session);
        Ok(())
    }
}

/// Refresh session table held in process memory.
///
/// The whole table sits behind one mutex, so rotation of any token is
/// serialized against every other write.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshSessionStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryRefreshSessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshSessionStore for MemoryRefreshSessionStore {
    async fn insert(&self, data: NewRefreshSession) -> AppResult<RefreshSession> {
        let session = data.into_session(Utc::now());
        let mut state = self.state.lock().await;
        state.insert(session.clone())?;
        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        let state = self.state.lock().await;
        Ok(state.get_by_hash(token_hash).cloned())
    }

    async fn chain(&self, token_hash: &str) -> AppResult<Vec<RefreshSession>> {
        let state = self.state.lock().await;
        let mut chain = Vec::new();
        let mut next = state.get_by_hash(token_hash);
        while let Some(row) = next {
            chain.push(row.clone());
            next = row.replaced_by.and_then(|id| state.rows.get(&id));
        }
        Ok(chain)
    }

    async fn rotate(&self, old_hash: &str, successor: Successor) -> AppResult<RotationOutcome> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let Some(current) = state.get_by_hash(old_hash).cloned() else {
            return Ok(RotationOutcome::NotFound);
        };

        match current.state_at(now) {
            SessionState::Rotated | SessionState::Revoked => return Ok(RotationOutcome::Revoked),
            SessionState::Expired => return Ok(RotationOutcome::Expired),
            SessionState::Active => {}
        }

        let next = NewRefreshSession {
            id: successor.id,
            user_id: current.user_id,
            token_hash: successor.token_hash,
            user_agent: current.user_agent.clone(),
            client_ip: current.client_ip.clone(),
            expires_at: successor.expires_at,
        }
        .into_session(now);

        // Insert first; a failure leaves the predecessor untouched.
        state.insert(next.clone())?;

        if let Some(row) = state.rows.get_mut(&current.id) {
            row.revoked_at = Some(now);
            row.replaced_by = Some(next.id);
        }

        Ok(RotationOutcome::Rotated {
            predecessor: current,
            successor: next,
        })
    }

    async fn revoke(&self, token_hash: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(id) = state.by_hash.get(token_hash).copied() else {
            return Ok(false);
        };
        match state.rows.get_mut(&id) {
            Some(row) if row.revoked_at.is_none() => {
                row.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut count = 0;
        for row in state.rows.values_mut() {
            if row.user_id == user_id && row.state_at(now).is_active() {
                row.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tenantauth_core::ErrorKind;

    fn new_session(user_id: Uuid, hash: &str) -> NewRefreshSession {
        NewRefreshSession {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash.to_string(),
            user_agent: Some("agent".to_string()),
            client_ip: Some("192.0.2.1".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn successor(hash: &str) -> Successor {
        Successor {
            id: Uuid::new_v4(),
            token_hash: hash.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_rotate_copies_metadata_and_links() {
        let store = MemoryRefreshSessionStore::new();
        let user = Uuid::new_v4();
        store.insert(new_session(user, "h1")).await.unwrap();

        let outcome = store.rotate("h1", successor("h2")).await.unwrap();
        let RotationOutcome::Rotated {
            predecessor,
            successor: next,
        } = outcome
        else {
            panic!("expected rotation");
        };
        assert_eq!(next.user_id, user);
        assert_eq!(next.client_ip.as_deref(), Some("192.0.2.1"));

        let old = store.find_by_hash("h1").await.unwrap().unwrap();
        assert_eq!(old.replaced_by, Some(next.id));
        assert_eq!(old.state(), SessionState::Rotated);
        assert_eq!(predecessor.id, old.id);

        assert!(matches!(
            store.rotate("h1", successor("h3")).await.unwrap(),
            RotationOutcome::Revoked
        ));
    }

    #[tokio::test]
    async fn test_duplicate_successor_leaves_old_row_active() {
        let store = MemoryRefreshSessionStore::new();
        let user = Uuid::new_v4();
        store.insert(new_session(user, "h1")).await.unwrap();
        store.insert(new_session(user, "taken")).await.unwrap();

        let err = store.rotate("h1", successor("taken")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let old = store.find_by_hash("h1").await.unwrap().unwrap();
        assert!(old.state().is_active());
        assert!(matches!(
            store.rotate("h1", successor("h2")).await.unwrap(),
            RotationOutcome::Rotated { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_and_expired() {
        let store = MemoryRefreshSessionStore::new();
        assert!(matches!(
            store.rotate("missing", successor("x")).await.unwrap(),
            RotationOutcome::NotFound
        ));

        let mut stale = new_session(Uuid::new_v4(), "old");
        stale.expires_at = Utc::now() - Duration::seconds(1);
        store.insert(stale).await.unwrap();
        assert!(matches!(
            store.rotate("old", successor("y")).await.unwrap(),
            RotationOutcome::Expired
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_one_user() {
        let store = MemoryRefreshSessionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert(new_session(alice, "a1")).await.unwrap();
        store.insert(new_session(alice, "a2")).await.unwrap();
        store.insert(new_session(bob, "b1")).await.unwrap();
        assert!(store.revoke("a2").await.unwrap());

        assert_eq!(store.revoke_all_for_user(alice).await.unwrap(), 1);
        assert_eq!(store.revoke_all_for_user(alice).await.unwrap(), 0);
        let bob_row = store.find_by_hash("b1").await.unwrap().unwrap();
        assert!(bob_row.state().is_active());
    }

    #[tokio::test]
    async fn test_chain_follows_replacements() {
        let store = MemoryRefreshSessionStore::new();
        store.insert(new_session(Uuid::new_v4(), "c1")).await.unwrap();
        store.rotate("c1", successor("c2")).await.unwrap();
        store.rotate("c2", successor("c3")).await.unwrap();

        let chain = store.chain("c1").await.unwrap();
        let hashes: Vec<_> = chain.iter().map(|s| s.token_hash.as_str()).collect();
        assert_eq!(hashes, ["c1", "c2", "c3"]);
        assert_eq!(store.chain("c3").await.unwrap().len(), 1);
        assert!(store.chain("nope").await.unwrap().is_empty());
    }
}
