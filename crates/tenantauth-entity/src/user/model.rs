//! Credential record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::UserStatus;

/// A global identity. Which tenants it can act in is decided by
/// memberships, not by the user row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique, stored lower-cased.
    pub email: String,
    /// PHC-format Argon2id string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account status; only active accounts may sign in.
    pub status: UserStatus,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last status or credential change.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account may exchange credentials.
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }
}

/// Insert payload; the caller hashes the password and normalises the
/// email first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Normalised email.
    pub email: String,
    /// PHC-format hash of the chosen password.
    pub password_hash: String,
}

/// Lookup and storage form of an email: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_hash_is_never_serialized() {
        let user = User {
            id: Uuid::nil(),
            email: "a@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "active");
    }
}
