//! Expense splitting.
//!
//! Validates an expense draft and derives its persisted breakdown:
//! equal payer contributions and normalized beneficiary ratios.

pub mod error;
pub mod splitter;

#[cfg(test)]
mod splitter_props;

pub use error::SplitError;
pub use splitter::{BeneficiaryWeight, ExpenseDraft, ExpenseSplitter, SplitPlan};
