//! Application-wide error types.
//!
//! `AppError` is the closed set of failure kinds every operation can surface.
//! Each kind has a stable machine-readable code and an HTTP status.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Malformed id, non-positive amount, missing field or invalid state change.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credential.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Actor lacks the role or ownership required for the target.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Referenced resource is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate join or duplicate resource.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Removal blocked by outstanding debt or credit.
    #[error("Balance not zero: {0}")]
    BalanceNotZero(String),

    /// A conditional write found the row in an unexpected state.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Storage or transaction failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) | Self::BalanceNotZero(_) | Self::StateConflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::BalanceNotZero(_) => "BALANCE_NOT_ZERO",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to callers. Internal details are withheld.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StateConflict(_) | Self::Internal(_))
    }
}
