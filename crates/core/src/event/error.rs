//! Event error types.

use tally_shared::AppError;
use thiserror::Error;

use crate::event::types::EventStatus;

/// Errors raised by event rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Name is blank.
    #[error("Event name is required")]
    EmptyName,

    /// Name is too long.
    #[error("Event name is longer than {max} characters")]
    NameTooLong {
        /// Maximum allowed characters.
        max: usize,
    },

    /// Description is too long.
    #[error("Event description is longer than {max} characters")]
    DescriptionTooLong {
        /// Maximum allowed characters.
        max: usize,
    },

    /// Currency code is malformed.
    #[error("{0}")]
    InvalidCurrency(String),

    /// Status change is not allowed.
    #[error("Event cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EventStatus,
        /// Requested status.
        to: EventStatus,
    },

    /// Event no longer accepts this change.
    #[error("Event is closed")]
    Closed,

    /// Caller is not the creator.
    #[error("Only the event creator can {0}")]
    NotCreator(&'static str),

    /// Stored status string is not recognized.
    #[error("Unknown event status: {0}")]
    UnknownStatus(String),
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotCreator(_) => Self::PermissionDenied(err.to_string()),
            EventError::UnknownStatus(_) => Self::Internal(err.to_string()),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
