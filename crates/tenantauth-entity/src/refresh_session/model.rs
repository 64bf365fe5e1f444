//! Refresh session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::state::SessionState;

/// A persisted refresh session.
///
/// Only the SHA-256 digest of the opaque token is stored. Rows are never
/// deleted; rotation stamps `revoked_at` and links the successor through
/// `replaced_by`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Hex-encoded SHA-256 digest of the raw refresh token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// User-Agent of the client that created the session.
    pub user_agent: Option<String>,
    /// Client IP address that created the session.
    pub client_ip: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being exchangeable.
    pub expires_at: DateTime<Utc>,
    /// When the session was revoked or rotated.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor session created by rotation.
    pub replaced_by: Option<Uuid>,
}

impl RefreshSession {
    /// Classify the row at the given instant.
    ///
    /// Revocation wins over expiry so that a replayed, rotated token is
    /// reported as revoked even after its original lifetime ends.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        match (self.revoked_at, self.replaced_by) {
            (Some(_), Some(_)) => SessionState::Rotated,
            (Some(_), None) => SessionState::Revoked,
            (None, _) if self.expires_at <= now => SessionState::Expired,
            (None, _) => SessionState::Active,
        }
    }

    /// Classify the row now.
    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }
}

/// Data required to insert a refresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRefreshSession {
    /// Pre-generated session id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Hex-encoded SHA-256 digest of the raw token.
    pub token_hash: String,
    /// Client User-Agent.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub client_ip: Option<String>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

impl NewRefreshSession {
    /// Materialise the row as it will be stored.
    pub fn into_session(self, created_at: DateTime<Utc>) -> RefreshSession {
        RefreshSession {
            id: self.id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            user_agent: self.user_agent,
            client_ip: self.client_ip,
            created_at,
            expires_at: self.expires_at,
            revoked_at: None,
            replaced_by: None,
        }
    }
}
