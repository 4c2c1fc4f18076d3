//! Repository abstractions for data access.
//!
//! Repositories load ledger rows, hand them to the pure rules in `tally-core`
//! and write the outcome back, one transaction per mutation. Storage errors
//! are logged here and surface as `AppError::Internal`.

mod scope;

pub mod collector;
pub mod event;
pub mod expense;
pub mod ledger;
pub mod participant;
pub mod payment_request;
pub mod settlement;
pub mod user;

pub use collector::{CollectorRepository, CollectorView, PaymentLinkInput, SetCollectorInput};
pub use event::{CreateEventInput, EventDetail, EventRepository, UpdateEventInput};
pub use expense::{
    BeneficiaryView, ExpenseDetail, ExpenseInput, ExpenseRepository, PayerView, TransactionItem,
};
pub use ledger::{EventOverview, LedgerRepository, LedgerSnapshot};
pub use participant::{
    AddGuestInput, JoinEventInput, ParticipantRepository, ParticipantView, UpdateParticipantInput,
};
pub use payment_request::{
    CreatePaymentRequestInput, PaymentParty, PaymentRequestRepository, PaymentRequestView,
};
pub use settlement::{CreateSettlementInput, SettlementRepository, SettlementView};
pub use user::UserRepository;
