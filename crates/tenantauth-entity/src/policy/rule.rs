//! Authorization policy rule.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// One allow rule over (subject, domain, resource, action).
///
/// `domain` and `resource` may be `*` or end in `*` to match by prefix;
/// `action` may be `*`. Rules are unique over the four-tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct PolicyRule {
    /// Policy subject (e.g. `tenant_owner`).
    pub subject: String,
    /// Domain pattern (e.g. `tenant:*`).
    pub domain: String,
    /// Resource pattern (e.g. `/v1/admin/*`).
    pub resource: String,
    /// Action name or `*`.
    pub action: String,
}

impl PolicyRule {
    /// Build a rule from its four parts.
    pub fn new(
        subject: impl Into<String>,
        domain: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            domain: domain.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.subject, self.domain, self.resource, self.action
        )
    }
}
