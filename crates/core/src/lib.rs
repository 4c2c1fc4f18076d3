//! Settlement engine for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage and transport layers load ledger rows, call into these modules, and
//! persist what comes back.
//!
//! # Modules
//!
//! - `allocation` - Largest remainder splitting of amounts
//! - `balance` - Per-participant balances derived from the ledger
//! - `settlement` - Greedy settlement planning and event summaries
//! - `expense` - Expense validation and payer/beneficiary split
//! - `participant` - Join, leave, kick and edit rules
//! - `payment` - Payment requests, collectors and payment links
//! - `event` - Event validation, status and stats
//! - `bank` - Optional bank routing details

pub mod allocation;
pub mod balance;
pub mod bank;
pub mod event;
pub mod expense;
pub mod participant;
pub mod payment;
pub mod settlement;

pub use bank::BankInfo;
