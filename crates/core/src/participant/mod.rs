//! Participant lifecycle rules.
//!
//! Who may join, add guests, edit, leave or remove participants, and the
//! zero-balance gate on removal.

pub mod policy;

pub use policy::{ParticipantPolicy, ParticipantRef};
