//! Unified application error types for SessionHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Authentication, authorization and
//! rate-limit failures carry a stable machine code so clients can decide
//! whether to refresh, re-login, show an upgrade prompt, or back off.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No credential was presented.
    NoToken,
    /// The token signature is bad or the token is malformed.
    InvalidToken,
    /// The token is past its expiry.
    TokenExpired,
    /// The refresh token was already used or explicitly revoked.
    TokenRevoked,
    /// The token is valid but its session is gone or past its sliding deadline.
    SessionExpired,
    /// Email/password pair did not match.
    InvalidCredentials,
    /// The caller's role does not satisfy the route's requirement.
    Forbidden,
    /// A rate-limit window is exhausted.
    RateLimited,
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, etc.).
    Conflict,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimited => "RATE_LIMITED",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::Database => "DATABASE_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Whether this kind represents a failure of the presented credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::NoToken
                | Self::InvalidToken
                | Self::TokenExpired
                | Self::TokenRevoked
                | Self::SessionExpired
                | Self::InvalidCredentials
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured diagnostics attached to some error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// RBAC denial: what the route required and what the caller had.
    Forbidden {
        /// Roles that would have been accepted.
        required_roles: Vec<String>,
        /// The caller's role.
        actual_role: String,
    },
    /// Rate-limit denial.
    RateLimited {
        /// Seconds until the current window resets.
        retry_after_secs: u64,
    },
}

/// The unified application error used throughout SessionHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured diagnostics.
    pub details: Option<ErrorDetails>,
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

    /// Machine-readable code of this error.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Create a missing-credential error.
    pub fn no_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoToken, message)
    }

    /// Create a bad-signature / malformed token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create a token-revoked error.
    pub fn token_revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenRevoked, message)
    }

    /// Create a session-expired error.
    pub fn session_expired() -> Self {
        Self::new(
            ErrorKind::SessionExpired,
            "Your session has expired due to inactivity. Please sign in again.",
        )
    }

    /// Create an invalid-credentials error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid email or password")
    }

    /// Create a role-mismatch error carrying the required and actual roles.
    pub fn forbidden(required_roles: Vec<String>, actual_role: impl Into<String>) -> Self {
        let actual_role = actual_role.into();
        let mut err = Self::new(
            ErrorKind::Forbidden,
            format!(
                "This action requires one of [{}], but your role is {actual_role}",
                required_roles.join(", ")
            ),
        );
        err.details = Some(ErrorDetails::Forbidden {
            required_roles,
            actual_role,
        });
        err
    }

    /// Create a too-many-requests error.
    ///
    /// `retry_after` is rounded up to whole seconds and never reported as zero.
    pub fn rate_limited(retry_after: Duration) -> Self {
        let mut secs = retry_after.as_secs();
        if retry_after.subsec_nanos() > 0 || secs == 0 {
            secs += 1;
        }
        let mut err = Self::new(
            ErrorKind::RateLimited,
            format!("Too many requests, retry in {secs}s"),
        );
        err.details = Some(ErrorDetails::RateLimited {
            retry_after_secs: secs,
        });
        err
    }

    /// Seconds a rate-limited caller should wait, if this is a rate-limit error.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match &self.details {
            Some(ErrorDetails::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
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
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
