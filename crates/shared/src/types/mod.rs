//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{
    AMOUNT_SCALE, BALANCE_TOLERANCE, CurrencyCode, MAX_AMOUNT, RATIO_SCALE, is_settled,
    is_storable_amount,
};
