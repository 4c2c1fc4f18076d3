//! Event rules: validation, status lifecycle and headline statistics.

pub mod error;
pub mod types;

pub use error::EventError;
pub use types::{EventDraft, EventService, EventStats, EventStatus};
