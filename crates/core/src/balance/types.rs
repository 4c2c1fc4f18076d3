//! Ledger records consumed by the balance calculator and its output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::money::is_storable_amount;
use tally_shared::types::{BALANCE_TOLERANCE, MAX_AMOUNT, ParticipantId};
use tally_shared::{AppError, AppResult};

/// Amount a participant put into one expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerLine {
    /// Paying participant.
    pub participant_id: ParticipantId,
    /// Amount paid.
    pub amount: Decimal,
}

/// Normalized share of one expense attributed to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryLine {
    /// Benefiting participant.
    pub participant_id: ParticipantId,
    /// Ratio in `[0, 1]`; ratios of one expense sum to 1.
    pub ratio: Decimal,
}

/// One expense with its full breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    /// Expense total.
    pub total: Decimal,
    /// Payer contributions.
    pub payers: Vec<PayerLine>,
    /// Beneficiary ratios.
    pub beneficiaries: Vec<BeneficiaryLine>,
}

/// A recorded transfer between two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    /// Participant who sent the money.
    pub payer_id: ParticipantId,
    /// Participant who received it.
    pub receiver_id: ParticipantId,
    /// Amount transferred.
    pub amount: Decimal,
}

impl SettlementRecord {
    /// Validates a direct transfer between two participants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive, over-precise or oversized amount, or
    /// when payer and receiver are the same participant.
    pub fn new(payer_id: ParticipantId, receiver_id: ParticipantId, amount: Decimal) -> AppResult<Self> {
        if amount <= Decimal::ZERO || !is_storable_amount(amount) {
            return Err(AppError::InvalidInput(format!(
                "settlement amount must be positive, at most {MAX_AMOUNT} with 4 decimals, got {amount}"
            )));
        }
        if payer_id == receiver_id {
            return Err(AppError::InvalidInput(
                "payer and receiver must be different participants".into(),
            ));
        }
        Ok(Self {
            payer_id,
            receiver_id,
            amount,
        })
    }
}

/// Sign classification of a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    /// Owed money by the group.
    Credit,
    /// Owes money to the group.
    Debit,
    /// Within tolerance of zero.
    Settled,
}

impl BalanceType {
    /// Classifies a signed balance.
    #[must_use]
    pub fn of(balance: Decimal) -> Self {
        if balance > BALANCE_TOLERANCE {
            Self::Credit
        } else if balance < -BALANCE_TOLERANCE {
            Self::Debit
        } else {
            Self::Settled
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Settled => "settled",
        }
    }
}

/// Totals and net balance for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantBalance {
    /// The participant.
    pub participant_id: ParticipantId,
    /// Sum of amounts paid for expenses.
    pub total_paid: Decimal,
    /// Sum of beneficiary shares.
    pub total_share: Decimal,
    /// Sum of settlements sent as payer.
    pub settled_sent: Decimal,
    /// Sum of settlements received.
    pub settled_received: Decimal,
    /// `(paid - share) + (sent - received)`.
    pub balance: Decimal,
}

impl ParticipantBalance {
    /// A participant with no ledger activity.
    #[must_use]
    pub const fn zero(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            total_paid: Decimal::ZERO,
            total_share: Decimal::ZERO,
            settled_sent: Decimal::ZERO,
            settled_received: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Classifies this balance.
    #[must_use]
    pub fn balance_type(&self) -> BalanceType {
        BalanceType::of(self.balance)
    }

    /// True when the balance is within tolerance of zero.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.balance_type() == BalanceType::Settled
    }
}
