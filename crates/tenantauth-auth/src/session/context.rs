//! Request-scoped values threaded explicitly through the session flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client metadata captured at the transport boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Remote address as reported by the transport.
    pub client_ip: Option<String>,
    /// User-Agent header.
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Builds a context from optional client metadata.
    pub fn new(client_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            client_ip,
            user_agent,
        }
    }

    /// Client IP used for throttling keys; `unknown` when absent.
    pub fn ip_or_unknown(&self) -> &str {
        self.client_ip.as_deref().unwrap_or("unknown")
    }
}

/// An authenticated caller, derived from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// The authenticated user.
    pub user_id: Uuid,
    /// Tenant the access token is bound to, if any.
    pub tenant_id: Option<Uuid>,
}
