//! Payment request state machine.
//!
//! ```text
//! pending ──confirm──▶ confirmed
//!    │
//!    └────cancel────▶ canceled
//! ```
//!
//! Terminal states have no exits. Only the payer may open a request and only
//! the receiver may confirm or cancel it. Confirmation is the single path that
//! records a settlement.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::AppError;
use tally_shared::types::ParticipantId;
use tally_shared::types::money::is_storable_amount;
use thiserror::Error;

/// Status of a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    /// Waiting for the receiver.
    Pending,
    /// Receiver confirmed; a settlement exists.
    Confirmed,
    /// Receiver declined.
    Canceled,
}

impl PaymentRequestStatus {
    /// Returns the stored string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }

    /// True for states with no outgoing transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Canceled)
    }

    /// Checks if a transition is allowed.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Confirmed | Self::Canceled)
        )
    }
}

impl fmt::Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentRequestStatus {
    type Err = PaymentRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            other => Err(PaymentRequestError::UnknownStatus(other.to_string())),
        }
    }
}

/// Errors raised by the payment request workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentRequestError {
    /// Amount must be strictly positive.
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Payer and receiver are the same participant.
    #[error("Payer and receiver must be different participants")]
    SameParticipant,

    /// Only the payer may open a request.
    #[error("Only the payer can create this payment request")]
    NotPayer,

    /// Only the receiver may confirm or cancel.
    #[error("Only the receiver can {action} this payment request")]
    NotReceiver {
        /// Attempted action.
        action: &'static str,
    },

    /// Status does not allow the requested transition.
    #[error("Payment request is {from}, cannot move to {to}")]
    InvalidTransition {
        /// Current status.
        from: PaymentRequestStatus,
        /// Requested status.
        to: PaymentRequestStatus,
    },

    /// A stored status string is not recognized.
    #[error("Unknown payment request status: {0}")]
    UnknownStatus(String),
}

impl PaymentRequestError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameParticipant => "SAME_PARTICIPANT",
            Self::NotPayer => "NOT_PAYER",
            Self::NotReceiver { .. } => "NOT_RECEIVER",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
        }
    }
}

impl From<PaymentRequestError> for AppError {
    fn from(err: PaymentRequestError) -> Self {
        match err {
            PaymentRequestError::InvalidAmount(_) | PaymentRequestError::SameParticipant => {
                Self::InvalidInput(err.to_string())
            }
            PaymentRequestError::NotPayer | PaymentRequestError::NotReceiver { .. } => {
                Self::PermissionDenied(err.to_string())
            }
            PaymentRequestError::InvalidTransition { .. } => Self::StateConflict(err.to_string()),
            PaymentRequestError::UnknownStatus(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Payer and receiver of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequestParties {
    /// Participant paying.
    pub payer_id: ParticipantId,
    /// Participant receiving.
    pub receiver_id: ParticipantId,
}

/// Stateless payment request transitions.
pub struct PaymentRequestService;

impl PaymentRequestService {
    /// Validates a new request opened by `requester`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive, over-precise or oversized amounts, self payments, and
    /// requesters other than the payer.
    pub fn validate_create(
        requester: ParticipantId,
        parties: PaymentRequestParties,
        amount: Decimal,
    ) -> Result<PaymentRequestStatus, PaymentRequestError> {
        if amount <= Decimal::ZERO || !is_storable_amount(amount) {
            return Err(PaymentRequestError::InvalidAmount(amount));
        }
        if parties.payer_id == parties.receiver_id {
            return Err(PaymentRequestError::SameParticipant);
        }
        if requester != parties.payer_id {
            return Err(PaymentRequestError::NotPayer);
        }
        Ok(PaymentRequestStatus::Pending)
    }

    /// Receiver confirms receipt.
    ///
    /// # Errors
    ///
    /// Returns `NotReceiver` or `InvalidTransition`.
    pub fn confirm(
        current: PaymentRequestStatus,
        requester: ParticipantId,
        parties: PaymentRequestParties,
    ) -> Result<PaymentRequestStatus, PaymentRequestError> {
        Self::receiver_transition(current, requester, parties, PaymentRequestStatus::Confirmed, "confirm")
    }

    /// Receiver declines the request.
    ///
    /// # Errors
    ///
    /// Returns `NotReceiver` or `InvalidTransition`.
    pub fn cancel(
        current: PaymentRequestStatus,
        requester: ParticipantId,
        parties: PaymentRequestParties,
    ) -> Result<PaymentRequestStatus, PaymentRequestError> {
        Self::receiver_transition(current, requester, parties, PaymentRequestStatus::Canceled, "cancel")
    }

    fn receiver_transition(
        current: PaymentRequestStatus,
        requester: ParticipantId,
        parties: PaymentRequestParties,
        to: PaymentRequestStatus,
        action: &'static str,
    ) -> Result<PaymentRequestStatus, PaymentRequestError> {
        if requester != parties.receiver_id {
            return Err(PaymentRequestError::NotReceiver { action });
        }
        if !current.can_transition_to(to) {
            return Err(PaymentRequestError::InvalidTransition { from: current, to });
        }
        Ok(to)
    }
}
