//! Entity re-exports.

pub use super::collectors::Entity as Collectors;
pub use super::events::Entity as Events;
pub use super::expense_beneficiaries::Entity as ExpenseBeneficiaries;
pub use super::expense_payers::Entity as ExpensePayers;
pub use super::expenses::Entity as Expenses;
pub use super::participants::Entity as Participants;
pub use super::payment_requests::Entity as PaymentRequests;
pub use super::settlements::Entity as Settlements;
pub use super::users::Entity as Users;
