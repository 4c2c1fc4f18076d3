//! `SeaORM` entities for the ledger tables.

pub mod prelude;

pub mod collectors;
pub mod events;
pub mod expense_beneficiaries;
pub mod expense_payers;
pub mod expenses;
pub mod participants;
pub mod payment_requests;
pub mod settlements;
pub mod users;
