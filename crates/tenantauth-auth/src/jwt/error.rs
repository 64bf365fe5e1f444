//! Token verification failures.

use thiserror::Error;

use tenantauth_core::error::{AppError, ErrorKind};

/// Why a token failed verification.
///
/// The variant is kept for audit logs; callers only ever see
/// `TokenInvalid` through [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong signature or signing algorithm.
    #[error("invalid token signature")]
    InvalidSignature,
    /// `exp` is in the past.
    #[error("token has expired")]
    Expired,
    /// `iss` does not match the configured issuer.
    #[error("token issuer mismatch")]
    IssuerMismatch,
    /// `aud` does not match the configured audience.
    #[error("token audience mismatch")]
    AudienceMismatch,
    /// Not a well-formed token or missing required claims.
    #[error("malformed token")]
    MalformedToken,
    /// Valid token of the wrong type for this use.
    #[error("wrong token type")]
    WrongTokenType,
}

impl TokenError {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::AudienceMismatch => "audience_mismatch",
            Self::MalformedToken => "malformed",
            Self::WrongTokenType => "wrong_token_type",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtKind;
        match err.kind() {
            JwtKind::ExpiredSignature => Self::Expired,
            JwtKind::InvalidIssuer => Self::IssuerMismatch,
            JwtKind::InvalidAudience => Self::AudienceMismatch,
            JwtKind::InvalidSignature | JwtKind::InvalidAlgorithm => Self::InvalidSignature,
            _ => Self::MalformedToken,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::new(ErrorKind::TokenInvalid, err.to_string())
            .with_details(serde_json::json!({ "reason": err.reason() }))
    }
}
