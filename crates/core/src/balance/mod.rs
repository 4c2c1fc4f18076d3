//! Participant balance computation.
//!
//! Balances are derived from the ledger on every read and never stored:
//! - Ledger input records (expenses with their breakdown, settlements)
//! - Per-participant totals and signed net balance
//! - Credit / debit / settled classification

pub mod calculator;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::BalanceCalculator;
pub use types::{
    BalanceType, BeneficiaryLine, ExpenseRecord, ParticipantBalance, PayerLine, SettlementRecord,
};
