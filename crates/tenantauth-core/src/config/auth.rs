//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Token, credential, and password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    pub jwt_secret: String,
    /// Expected `iss` claim.
    pub jwt_issuer: String,
    /// Expected `aud` claim.
    pub jwt_audience: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh session TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Number of random bytes in an opaque refresh token.
    #[serde(default = "default_refresh_token_bytes")]
    pub refresh_token_bytes: usize,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Argon2 iteration count (time cost).
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
    /// Upper bound on any single storage-bound step, in milliseconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

impl AuthConfig {
    /// Builds a config with default TTLs around the given signing parameters.
    pub fn for_secret(issuer: &str, audience: &str, secret: &str) -> Self {
        Self {
            jwt_secret: secret.to_string(),
            jwt_issuer: issuer.to_string(),
            jwt_audience: audience.to_string(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            refresh_token_bytes: default_refresh_token_bytes(),
            password_min_length: default_password_min(),
            password_hash_cost: default_hash_cost(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_minutes * 60)
    }

    /// Refresh session lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_hours * 3600)
    }

    /// Per-step storage timeout.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Rejects empty signing parameters and non-positive limits.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_issuer.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_issuer is required"));
        }
        if self.jwt_audience.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_audience is required"));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret is required"));
        }
        if self.access_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.access_ttl_minutes must be greater than 0",
            ));
        }
        if self.refresh_ttl_hours == 0 {
            return Err(AppError::configuration(
                "auth.refresh_ttl_hours must be greater than 0",
            ));
        }
        if self.refresh_token_bytes < 16 {
            return Err(AppError::configuration(
                "auth.refresh_token_bytes must be at least 16",
            ));
        }
        if self.password_min_length == 0 {
            return Err(AppError::configuration(
                "auth.password_min_length must be greater than 0",
            ));
        }
        if !(1..=10).contains(&self.password_hash_cost) {
            return Err(AppError::configuration(
                "auth.password_hash_cost must be between 1 and 10",
            ));
        }
        if self.operation_timeout_ms == 0 {
            return Err(AppError::configuration(
                "auth.operation_timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_refresh_token_bytes() -> usize {
    32
}

fn default_password_min() -> usize {
    8
}

fn default_hash_cost() -> u32 {
    2
}

fn default_operation_timeout() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let cfg = AuthConfig::for_secret("iss", "aud", "secret");
        assert_eq!(cfg.access_ttl(), Duration::from_secs(900));
        assert_eq!(cfg.refresh_ttl(), Duration::from_secs(168 * 3600));
    }

    #[test]
    fn test_rejects_empty_secret() {
        let cfg = AuthConfig::for_secret("iss", "aud", " ");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_cost() {
        let mut cfg = AuthConfig::for_secret("iss", "aud", "secret");
        cfg.password_hash_cost = 0;
        assert!(cfg.validate().is_err());
        cfg.password_hash_cost = 11;
        assert!(cfg.validate().is_err());
        cfg.password_hash_cost = 3;
        assert!(cfg.validate().is_ok());
    }
}
