//! Signed token creation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tenantauth_core::config::AuthConfig;
use tenantauth_core::error::AppError;

use super::claims::{Claims, TokenType};

/// A freshly signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact JWS.
    pub token: String,
    /// Expiry embedded in the token.
    pub expires_at: DateTime<Utc>,
}

/// Creates HS256-signed tokens carrying issuer and audience.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::configuration("JWT signing secret is empty"));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        })
    }

    /// Signs a token for `subject` valid for `ttl` from now.
    pub fn issue(
        &self,
        subject: Uuid,
        tenant: Option<Uuid>,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, AppError> {
        self.issue_at(subject, tenant, token_type, ttl, Utc::now())
    }

    /// Signs a token as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: Uuid,
        tenant: Option<Uuid>,
        token_type: TokenType,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AppError::configuration("Token TTL is out of range"))?;
        let expires_at = issued_at + ttl;

        let claims = Claims {
            sub: subject,
            tid: tenant,
            typ: token_type,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode {token_type} token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
