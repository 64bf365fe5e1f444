//! Argon2id credential hashing.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use tenantauth_core::config::AuthConfig;
use tenantauth_core::error::AppError;

/// Produces and checks PHC-format Argon2id strings.
///
/// The configured time cost only applies to new hashes. Verification reads
/// the parameters embedded in the stored string, so raising the cost does
/// not lock out existing accounts.
#[derive(Clone)]
pub struct PasswordHasher {
    argon: Argon2<'static>,
    t_cost: u32,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("t_cost", &self.t_cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Create a hasher using the configured time cost.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        Self::with_cost(config.password_hash_cost)
    }

    /// Default memory and lane settings with `t_cost` iterations.
    pub fn with_cost(t_cost: u32) -> Result<Self, AppError> {
        let params = Params::new(Params::DEFAULT_M_COST, t_cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::configuration(format!("Argon2 time cost {t_cost}: {e}")))?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            t_cost,
        })
    }

    /// Hashes with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        password_hash::PasswordHasher::hash_password(&self.argon, password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| AppError::internal(format!("Argon2 hashing failed: {e}")))
    }

    /// `Ok(false)` on mismatch. A stored value that is not a PHC string is
    /// an internal error, not a mismatch.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        let phc = PasswordHash::new(stored)
            .map_err(|e| AppError::internal(format!("Stored hash is not a PHC string: {e}")))?;

        match self.argon.verify_password(password.as_bytes(), &phc) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Argon2 verification failed: {e}"))),
        }
    }
}
