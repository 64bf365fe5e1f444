//! Acceptance rules for new passwords.

use tenantauth_core::config::AuthConfig;
use tenantauth_core::error::AppError;

/// Minimum length (in characters) and a not-all-whitespace check.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Create a validator from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validate a candidate password against the policy.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.trim().is_empty() {
            return Err(AppError::validation("Password must not be blank"));
        }
        let length = password.chars().count();
        if length < self.min_length {
            return Err(AppError::validation(format!(
                "Password has {length} characters; at least {} required",
                self.min_length
            )));
        }
        Ok(())
    }
}
