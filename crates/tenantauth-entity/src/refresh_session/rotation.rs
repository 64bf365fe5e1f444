//! Rotation request and outcome values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::RefreshSession;

/// The row that replaces a rotated session. Client metadata and the
/// owning user are copied from the predecessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Successor {
    /// Pre-generated id of the new session.
    pub id: Uuid,
    /// Digest of the new raw token.
    pub token_hash: String,
    /// Absolute expiry of the new session.
    pub expires_at: DateTime<Utc>,
}

/// Result of an atomic rotation attempt.
///
/// Only `Rotated` means anything was written.
#[derive(Debug, Clone)]
pub enum RotationOutcome {
    /// The predecessor was consumed and `successor` inserted.
    Rotated {
        /// The consumed row, as it was before the update.
        predecessor: RefreshSession,
        /// The newly inserted row.
        successor: RefreshSession,
    },
    /// No row matches the digest.
    NotFound,
    /// The row was already revoked or rotated.
    Revoked,
    /// The row is past its expiry.
    Expired,
}
