//! Whether an account may sign in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tenantauth_core::AppError;

/// Stored as the Postgres enum `user_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// May sign in.
    Active,
    /// Every credential exchange is refused; existing refresh sessions
    /// stay valid until revoked.
    Disabled,
}

impl UserStatus {
    /// Check if this status permits sign-in.
    pub fn can_login(&self) -> bool {
        *self == Self::Active
    }

    /// Return the status as its stored lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Active, Self::Disabled]
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::validation(format!("Unknown user status '{s}' (active, disabled)"))
            })
    }
}
