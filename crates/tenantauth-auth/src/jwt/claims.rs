//! JWT claims structure used in access tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Claims payload embedded in every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: Uuid,
    /// Tenant the token is bound to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<Uuid>,
    /// Token type.
    pub typ: TokenType,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Distinguishes access tokens from other token kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token for API requests.
    Access,
    /// Token kind reserved for refresh exchanges.
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the bound tenant, if any.
    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_token_omits_tid() {
        let claims = Claims {
            sub: Uuid::nil(),
            tid: None,
            typ: TokenType::Access,
            iss: "tenantauth".into(),
            aud: "tenantauth-api".into(),
            iat: 0,
            exp: 60,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("tid").is_none());
        assert_eq!(json["typ"], "access");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }
}
