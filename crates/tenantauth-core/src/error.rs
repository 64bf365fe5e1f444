//! Unified application error types for TenantAuth.
//!
//! Every failure in the authentication engine is reported as an [`AppError`]
//! carrying one [`ErrorKind`] from a closed set. Callers branch on the kind,
//! never on the message. The kind maps to exactly one [`Outward`] signal so
//! that the HTTP layer can answer uniformly without learning which internal
//! check failed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed categorisation of every error the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unknown identity, wrong password, or inactive account.
    InvalidCredential,
    /// No refresh session matches the presented credential.
    SessionNotFound,
    /// The refresh session was revoked or already rotated.
    SessionRevoked,
    /// The refresh session is past its expiry.
    SessionExpired,
    /// Too many failed login attempts for this client and identity.
    RateLimited,
    /// The policy engine denied the action.
    PolicyDenied,
    /// A tenant role outside the closed role set was encountered.
    InvalidRole,
    /// The access token failed verification.
    TokenInvalid,
    /// Input validation failed at the boundary.
    Validation,
    /// A uniqueness constraint was violated.
    Conflict,
    /// A referenced record does not exist.
    NotFound,
    /// Durable storage or the counter store could not be reached.
    Unavailable,
    /// Configuration is missing or inconsistent.
    Configuration,
    /// Any other failure.
    Internal,
}

/// The externally visible signal for an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outward {
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller is authenticated but not allowed.
    Forbidden,
    /// The request was malformed.
    BadRequest,
    /// The request conflicts with existing state.
    Conflict,
    /// The target does not exist.
    NotFound,
    /// A dependency is down; the transport may retry.
    Unavailable,
    /// Unexpected server failure.
    Internal,
}

impl ErrorKind {
    /// Collapses the kind into the signal shown to callers.
    ///
    /// Every authentication failure is `Unauthorized` regardless of cause.
    pub fn outward(&self) -> Outward {
        match self {
            Self::InvalidCredential
            | Self::SessionNotFound
            | Self::SessionRevoked
            | Self::SessionExpired
            | Self::RateLimited
            | Self::TokenInvalid => Outward::Unauthorized,
            Self::PolicyDenied => Outward::Forbidden,
            Self::Validation => Outward::BadRequest,
            Self::Conflict => Outward::Conflict,
            Self::NotFound => Outward::NotFound,
            Self::Unavailable => Outward::Unavailable,
            Self::InvalidRole | Self::Configuration | Self::Internal => Outward::Internal,
        }
    }

    /// Whether the transport layer may retry the failed call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Whether the kind is a security decision that must never be retried.
    pub fn is_security_denial(&self) -> bool {
        matches!(
            self,
            Self::SessionRevoked | Self::PolicyDenied | Self::InvalidCredential | Self::RateLimited
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "INVALID_CREDENTIAL"),
            Self::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            Self::SessionRevoked => write!(f, "SESSION_REVOKED"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::PolicyDenied => write!(f, "POLICY_DENIED"),
            Self::InvalidRole => write!(f, "INVALID_ROLE"),
            Self::TokenInvalid => write!(f, "TOKEN_INVALID"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl fmt::Display for Outward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal_error",
        };
        f.write_str(s)
    }
}

/// The unified application error used throughout TenantAuth.
///
/// `message` and `details` are for audit logging; only [`ErrorKind::outward`]
/// is meant to reach the client.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Structured detail payload (e.g. `{"reason": "expired"}`).
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach a structured detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns the `reason` field of the detail payload, if any.
    pub fn reason(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("reason"))
            .and_then(|r| r.as_str())
    }

    /// Shorthand for `self.kind.outward()`.
    pub fn outward(&self) -> Outward {
        self.kind.outward()
    }

    /// Create an invalid-credential error.
    pub fn invalid_credential() -> Self {
        Self::new(ErrorKind::InvalidCredential, "Invalid credentials")
    }

    /// Create a session-not-found error.
    pub fn session_not_found() -> Self {
        Self::new(ErrorKind::SessionNotFound, "Refresh session not found")
    }

    /// Create a session-revoked error.
    pub fn session_revoked() -> Self {
        Self::new(ErrorKind::SessionRevoked, "Refresh session revoked")
    }

    /// Create a session-expired error.
    pub fn session_expired() -> Self {
        Self::new(ErrorKind::SessionExpired, "Refresh session expired")
    }

    /// Create a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a policy-denied error.
    pub fn policy_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyDenied, message)
    }

    /// Create an invalid-role error.
    pub fn invalid_role(role: &str) -> Self {
        Self::new(ErrorKind::InvalidRole, format!("Invalid tenant role: '{role}'"))
    }

    /// Create a token-invalid error.
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenInvalid, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
