//! Derived lifecycle state of a refresh session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a refresh session row.
///
/// Transitions are monotone: `Active` moves to exactly one of the other
/// three states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Usable for exactly one rotation.
    Active,
    /// Consumed by a rotation; `replaced_by` points at the successor.
    Rotated,
    /// Revoked by logout or a bulk revoke.
    Revoked,
    /// Past its expiry without being revoked.
    Expired,
}

impl SessionState {
    /// Whether the session can still be exchanged.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether `revoked_at` has been stamped on the row.
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Rotated | Self::Revoked)
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rotated => "rotated",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
