//! Refresh session ledger: opaque token issuance, single-use rotation,
//! and revocation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_entity::refresh_session::{
    NewRefreshSession, RefreshSession, RotationOutcome, Successor,
};

use super::context::RequestContext;
use super::store::RefreshSessionStore;
use super::token::{generate_refresh_token, hash_refresh_token, is_well_formed};

/// A newly issued refresh token. `token` is the only copy of the raw
/// secret and must be handed to the client once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedRefreshToken {
    /// Raw opaque token.
    pub token: String,
    /// Session row id.
    pub session_id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// Converts a std duration into a chrono one for expiry arithmetic.
fn chrono_ttl(ttl: Duration) -> AppResult<chrono::Duration> {
    chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::configuration(format!("Refresh TTL out of range: {e}")))
}

/// Issues, rotates, and revokes refresh sessions.
#[derive(Debug, Clone)]
pub struct RefreshLedger {
    store: Arc<dyn RefreshSessionStore>,
    token_bytes: usize,
}

impl RefreshLedger {
    /// Creates a ledger generating tokens of `token_bytes` random bytes.
    pub fn new(store: Arc<dyn RefreshSessionStore>, token_bytes: usize) -> Self {
        Self { store, token_bytes }
    }

    /// Rejects tokens that could not have been issued by this ledger
    /// without touching storage.
    pub fn validate_format(&self, raw: &str) -> AppResult<()> {
        if is_well_formed(raw) {
            Ok(())
        } else {
            Err(AppError::session_not_found()
                .with_details(serde_json::json!({ "reason": "malformed" })))
        }
    }

    /// Creates a new active session for `user_id`.
    pub async fn create(
        &self,
        user_id: Uuid,
        ttl: Duration,
        ctx: &RequestContext,
    ) -> AppResult<IssuedRefreshToken> {
        let raw = generate_refresh_token(self.token_bytes);
        let data = NewRefreshSession {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_refresh_token(&raw),
            user_agent: ctx.user_agent.clone(),
            client_ip: ctx.client_ip.clone(),
            expires_at: Utc::now() + chrono_ttl(ttl)?,
        };
        let session = self.store.insert(data).await?;

        debug!(user_id = %user_id, session_id = %session.id, "Refresh session created");

        Ok(IssuedRefreshToken {
            token: raw,
            session_id: session.id,
            user_id,
            expires_at: session.expires_at,
        })
    }

    /// Exchanges `old_raw` for a new token. The old token is consumed.
    ///
    /// Errors: `SessionNotFound` for unknown or malformed tokens,
    /// `SessionRevoked` for revoked or already rotated ones, and
    /// `SessionExpired` past expiry.
    pub async fn rotate(&self, old_raw: &str, ttl: Duration) -> AppResult<IssuedRefreshToken> {
        self.validate_format(old_raw)?;

        let raw = generate_refresh_token(self.token_bytes);
        let successor = Successor {
            id: Uuid::new_v4(),
            token_hash: hash_refresh_token(&raw),
            expires_at: Utc::now() + chrono_ttl(ttl)?,
        };

        match self
            .store
            .rotate(&hash_refresh_token(old_raw), successor)
            .await?
        {
            RotationOutcome::Rotated {
                predecessor,
                successor,
            } => {
                info!(
                    user_id = %successor.user_id,
                    previous_session = %predecessor.id,
                    session_id = %successor.id,
                    "Refresh session rotated"
                );
                Ok(IssuedRefreshToken {
                    token: raw,
                    session_id: successor.id,
                    user_id: successor.user_id,
                    expires_at: successor.expires_at,
                })
            }
            RotationOutcome::NotFound => Err(AppError::session_not_found()),
            RotationOutcome::Revoked => Err(AppError::session_revoked()),
            RotationOutcome::Expired => Err(AppError::session_expired()),
        }
    }

    /// Revokes one session. Unknown, malformed, or already revoked tokens
    /// are not an error.
    pub async fn revoke(&self, raw: &str) -> AppResult<()> {
        if !is_well_formed(raw) {
            return Ok(());
        }
        if self.store.revoke(&hash_refresh_token(raw)).await? {
            debug!("Refresh session revoked");
        }
        Ok(())
    }

    /// Revokes every active session of `user_id`.
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        let count = self.store.revoke_all_for_user(user_id).await?;
        if count > 0 {
            warn!(user_id = %user_id, count, "All refresh sessions revoked");
        }
        Ok(count)
    }

    /// Looks up the session row for `raw`, for audit.
    pub async fn find(&self, raw: &str) -> AppResult<Option<RefreshSession>> {
        if !is_well_formed(raw) {
            return Ok(None);
        }
        self.store.find_by_hash(&hash_refresh_token(raw)).await
    }

    /// Rotation chain starting at `raw`, oldest first.
    pub async fn chain(&self, raw: &str) -> AppResult<Vec<RefreshSession>> {
        if !is_well_formed(raw) {
            return Ok(Vec::new());
        }
        self.store.chain(&hash_refresh_token(raw)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::MemoryRefreshSessionStore;
    use tenantauth_core::ErrorKind;
    use tenantauth_entity::refresh_session::SessionState;

    const TTL: Duration = Duration::from_secs(3600);

    fn ledger() -> RefreshLedger {
        RefreshLedger::new(Arc::new(MemoryRefreshSessionStore::new()), 32)
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Some("198.51.100.4".into()), Some("test-agent".into()))
    }

    #[tokio::test]
    async fn test_only_digest_is_stored() {
        let ledger = ledger();
        let issued = ledger.create(Uuid::new_v4(), TTL, &ctx()).await.unwrap();
        let row = ledger.find(&issued.token).await.unwrap().unwrap();
        assert_eq!(row.token_hash, hash_refresh_token(&issued.token));
        assert_ne!(row.token_hash, issued.token);
        assert_eq!(row.user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn test_rotation_chain_and_replay() {
        let ledger = ledger();
        let user = Uuid::new_v4();
        let t1 = ledger.create(user, TTL, &ctx()).await.unwrap();

        let t2 = ledger.rotate(&t1.token, TTL).await.unwrap();
        assert_eq!(t2.user_id, user);
        assert_ne!(t2.token, t1.token);

        let replay = ledger.rotate(&t1.token, TTL).await.unwrap_err();
        assert_eq!(replay.kind, ErrorKind::SessionRevoked);

        let t3 = ledger.rotate(&t2.token, TTL).await.unwrap();
        assert_eq!(t3.user_id, user);

        let chain = ledger.chain(&t1.token).await.unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].state(), SessionState::Rotated);
        assert_eq!(chain[2].id, t3.session_id);
        assert!(chain[2].state().is_active());
    }

    #[tokio::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let ledger = ledger();
        let t1 = ledger.create(Uuid::new_v4(), TTL, &ctx()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            let raw = t1.token.clone();
            handles.push(tokio::spawn(async move { ledger.rotate(&raw, TTL).await }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert_eq!(e.kind, ErrorKind::SessionRevoked),
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_rotate_errors() {
        let ledger = ledger();
        let unknown = generate_refresh_token(32);
        assert_eq!(
            ledger.rotate(&unknown, TTL).await.unwrap_err().kind,
            ErrorKind::SessionNotFound
        );
        assert_eq!(
            ledger.rotate("not/base64+", TTL).await.unwrap_err().kind,
            ErrorKind::SessionNotFound
        );

        let short = ledger
            .create(Uuid::new_v4(), Duration::ZERO, &ctx())
            .await
            .unwrap();
        assert_eq!(
            ledger.rotate(&short.token, TTL).await.unwrap_err().kind,
            ErrorKind::SessionExpired
        );
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let ledger = ledger();
        let t1 = ledger.create(Uuid::new_v4(), TTL, &ctx()).await.unwrap();
        ledger.revoke(&t1.token).await.unwrap();
        ledger.revoke(&t1.token).await.unwrap();
        ledger.revoke("").await.unwrap();
        ledger.revoke(&generate_refresh_token(32)).await.unwrap();

        assert_eq!(
            ledger.rotate(&t1.token, TTL).await.unwrap_err().kind,
            ErrorKind::SessionRevoked
        );
    }

    #[tokio::test]
    async fn test_revoke_all_scoped_to_user() {
        let ledger = ledger();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let a1 = ledger.create(alice, TTL, &ctx()).await.unwrap();
        ledger.create(alice, TTL, &ctx()).await.unwrap();
        let b1 = ledger.create(bob, TTL, &ctx()).await.unwrap();

        assert_eq!(ledger.revoke_all(alice).await.unwrap(), 2);
        assert_eq!(
            ledger.rotate(&a1.token, TTL).await.unwrap_err().kind,
            ErrorKind::SessionRevoked
        );
        assert!(ledger.rotate(&b1.token, TTL).await.is_ok());
    }
}
