//! Login failure throttling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fixed-window limits for failed login attempts per (client IP, email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Failures allowed inside one window before logins are refused.
    #[serde(default = "default_limit")]
    pub login_fail_limit: u32,
    /// Window length in minutes.
    #[serde(default = "default_window")]
    pub login_fail_window_minutes: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_fail_limit: default_limit(),
            login_fail_window_minutes: default_window(),
        }
    }
}

impl RateLimitConfig {
    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.login_fail_window_minutes * 60)
    }

    /// Rejects a zero limit or window.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.login_fail_limit == 0 {
            return Err(AppError::configuration(
                "rate_limit.login_fail_limit must be greater than 0",
            ));
        }
        if self.login_fail_window_minutes == 0 {
            return Err(AppError::configuration(
                "rate_limit.login_fail_window_minutes must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_limit() -> u32 {
    5
}

fn default_window() -> u64 {
    10
}
