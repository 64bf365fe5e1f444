//! Mapping from tenant roles to policy subjects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tenantauth_core::error::AppError;
use tenantauth_entity::tenant::TenantRole;

/// Subject name used in policy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySubject {
    /// Derived from the `owner` tenant role.
    TenantOwner,
    /// Derived from the `admin` tenant role.
    TenantAdmin,
    /// Derived from the `member` tenant role.
    Member,
}

impl PolicySubject {
    /// All subjects.
    pub const ALL: [PolicySubject; 3] = [Self::TenantOwner, Self::TenantAdmin, Self::Member];

    /// Name as stored in policy rules.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantOwner => "tenant_owner",
            Self::TenantAdmin => "tenant_admin",
            Self::Member => "member",
        }
    }
}

impl From<TenantRole> for PolicySubject {
    fn from(role: TenantRole) -> Self {
        match role {
            TenantRole::Owner => Self::TenantOwner,
            TenantRole::Admin => Self::TenantAdmin,
            TenantRole::Member => Self::Member,
        }
    }
}

impl fmt::Display for PolicySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicySubject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Unknown policy subject: '{s}'. Expected one of: tenant_owner, tenant_admin, member"
                ))
            })
    }
}

/// Maps a stored tenant role string to its policy subject.
///
/// Anything outside `owner`, `admin`, `member` is `InvalidRole`.
pub fn map_role(role: &str) -> Result<PolicySubject, AppError> {
    role.parse::<TenantRole>().map(PolicySubject::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tenantauth_core::ErrorKind;

    #[test]
    fn test_map_role_total_and_injective() {
        let mapped: HashSet<_> = TenantRole::ALL
            .iter()
            .map(|r| map_role(r.as_str()).unwrap())
            .collect();
        assert_eq!(mapped.len(), TenantRole::ALL.len());
        assert_eq!(map_role("owner").unwrap(), PolicySubject::TenantOwner);
        assert_eq!(map_role("admin").unwrap(), PolicySubject::TenantAdmin);
        assert_eq!(map_role("member").unwrap(), PolicySubject::Member);
    }

    #[test]
    fn test_unknown_role_rejected() {
        for raw in ["guest", "OWNER", "", "tenant_owner"] {
            assert_eq!(map_role(raw).unwrap_err().kind, ErrorKind::InvalidRole);
        }
    }

    #[test]
    fn test_subject_names_parse() {
        for subject in PolicySubject::ALL {
            assert_eq!(subject.as_str().parse::<PolicySubject>().unwrap(), subject);
        }
        assert!("owner".parse::<PolicySubject>().is_err());
    }
}
