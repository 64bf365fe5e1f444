//! Fixed-window failed-login counter over the shared counter store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tenantauth_cache::keys;
use tenantauth_core::config::RateLimitConfig;
use tenantauth_core::traits::CounterStore;

use crate::timeout::with_timeout;

/// Identifies one throttling bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginRateKey {
    /// Client IP as reported by the transport.
    pub client_ip: String,
    /// Normalised email the login targeted.
    pub email: String,
}

impl LoginRateKey {
    /// Builds a key from its parts.
    pub fn new(client_ip: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for LoginRateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&keys::login_failures(&self.client_ip, &self.email))
    }
}

/// Counts failed logins per [`LoginRateKey`] in a fixed window.
///
/// The window starts at the first failure and is not extended by later
/// ones, so up to twice the limit can slip through across a boundary.
/// Counter store failures fail open: the limiter never blocks when it
/// cannot read its state.
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    counters: Option<Arc<dyn CounterStore>>,
    limit: u64,
    window: Duration,
    op_timeout: Duration,
}

impl LoginRateLimiter {
    /// Creates a limiter. `None` disables throttling.
    pub fn new(
        counters: Option<Arc<dyn CounterStore>>,
        config: &RateLimitConfig,
        op_timeout: Duration,
    ) -> Self {
        if counters.is_none() {
            warn!("Login rate limiter has no counter store; throttling disabled");
        }
        Self {
            counters,
            limit: u64::from(config.login_fail_limit),
            window: config.window(),
            op_timeout,
        }
    }

    /// Whether the key has reached the failure limit.
    pub async fn is_blocked(&self, key: &LoginRateKey) -> bool {
        let Some(counters) = &self.counters else {
            return false;
        };
        let name = key.to_string();
        match with_timeout(self.op_timeout, "rate_limit_check", counters.count(&name)).await {
            Ok(failures) => failures >= self.limit,
            Err(e) => {
                warn!(error = %e, "Login rate check failed; allowing attempt");
                false
            }
        }
    }

    /// Counts one failed attempt.
    pub async fn record_failure(&self, key: &LoginRateKey) {
        let Some(counters) = &self.counters else {
            return;
        };
        let name = key.to_string();
        let hit = counters.hit(&name, self.window);
        match with_timeout(self.op_timeout, "rate_limit_hit", hit).await {
            Ok(failures) => debug!(key = %name, failures, "Login failure recorded"),
            Err(e) => warn!(error = %e, "Failed to record login failure"),
        }
    }

    /// Resets the counter after a successful login.
    pub async fn clear(&self, key: &LoginRateKey) {
        let Some(counters) = &self.counters else {
            return;
        };
        let name = key.to_string();
        if let Err(e) = with_timeout(self.op_timeout, "rate_limit_reset", counters.reset(&name)).await {
            warn!(error = %e, "Failed to clear login failure counter");
        }
    }
}
