//! Expense validation errors.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{MAX_AMOUNT, ParticipantId};
use thiserror::Error;

/// Errors raised while validating an expense draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    // ========== Amount Errors ==========
    /// Total must be strictly positive.
    #[error("Expense amount must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// Total carries more fractional digits than money amounts keep.
    #[error("Expense amount {0} has too many decimal places")]
    TooPrecise(Decimal),

    /// Total does not fit a money column.
    #[error("Expense amount {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    TooLarge(Decimal),

    // ========== Shape Errors ==========
    /// Description is blank.
    #[error("Expense description is required")]
    EmptyDescription,

    /// Description exceeds the maximum length.
    #[error("Expense description is longer than {max} characters")]
    DescriptionTooLong {
        /// Maximum allowed characters.
        max: usize,
    },

    /// No payer given.
    #[error("Expense needs at least one payer")]
    NoPayers,

    /// No beneficiary given.
    #[error("Expense needs at least one beneficiary")]
    NoBeneficiaries,

    /// A payer is listed twice.
    #[error("Participant {0} is listed twice as payer")]
    DuplicatePayer(ParticipantId),

    /// A beneficiary is listed twice.
    #[error("Participant {0} is listed twice as beneficiary")]
    DuplicateBeneficiary(ParticipantId),

    // ========== Weight Errors ==========
    /// A weight is negative.
    #[error("Weight for participant {0} is negative")]
    NegativeWeight(ParticipantId),

    /// A weight exceeds the allowed maximum.
    #[error("Weight for participant {participant} is larger than {max}")]
    WeightTooLarge {
        /// Offending beneficiary.
        participant: ParticipantId,
        /// Largest accepted weight.
        max: Decimal,
    },

    /// Weights do not add up to a positive number.
    #[error("Beneficiary weights must sum to a positive value")]
    NonPositiveWeightSum,

    // ========== Membership Errors ==========
    /// Referenced participant is not part of the event.
    #[error("Participant {0} not found in this event")]
    UnknownParticipant(ParticipantId),
}

impl SplitError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveTotal(_) => "NON_POSITIVE_AMOUNT",
            Self::TooPrecise(_) => "AMOUNT_TOO_PRECISE",
            Self::TooLarge(_) => "AMOUNT_TOO_LARGE",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::NoPayers => "NO_PAYERS",
            Self::NoBeneficiaries => "NO_BENEFICIARIES",
            Self::DuplicatePayer(_) => "DUPLICATE_PAYER",
            Self::DuplicateBeneficiary(_) => "DUPLICATE_BENEFICIARY",
            Self::NegativeWeight(_) => "NEGATIVE_WEIGHT",
            Self::WeightTooLarge { .. } => "WEIGHT_TOO_LARGE",
            Self::NonPositiveWeightSum => "NON_POSITIVE_WEIGHT_SUM",
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
        }
    }
}

impl From<SplitError> for AppError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::UnknownParticipant(_) => Self::NotFound(err.to_string()),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
