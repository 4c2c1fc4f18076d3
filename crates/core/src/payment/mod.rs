//! Payments: request workflow, collector selection and payment links.
//!
//! # Modules
//!
//! - `request` - Payment request state machine (pending → confirmed | canceled)
//! - `collector` - Default receive-target selection for an event
//! - `link` - Rendering a bank transfer link for an amount

pub mod collector;
pub mod link;
pub mod request;

#[cfg(test)]
mod request_props;

pub use collector::CollectorPolicy;
pub use link::{
    PaymentLink, PaymentLinkRenderer, QuickLinkRenderer, ReceivingAccount, build_link, transfer_note,
};
pub use request::{
    PaymentRequestError, PaymentRequestParties, PaymentRequestService, PaymentRequestStatus,
};
