//! Tenant membership role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tenantauth_core::AppError;

/// Role a user holds inside one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    /// Created the tenant; full administrative rights.
    Owner,
    /// Administers the tenant.
    Admin,
    /// Regular member.
    Member,
}

impl TenantRole {
    /// All roles, in descending privilege.
    pub const ALL: [TenantRole; 3] = [Self::Owner, Self::Admin, Self::Member];

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TenantRole {
    type Err = AppError;

    /// Exact match only; stored roles are lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(AppError::invalid_role(s)),
        }
    }
}
