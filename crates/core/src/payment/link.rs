//! Payment link rendering.
//!
//! Turns a receiving account, an amount and a transfer note into a link an
//! image service renders as a scannable bank transfer code.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tally_shared::{AppError, AppResult};

use crate::bank::BankInfo;

/// A bank account that can receive a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivingAccount {
    /// Bank name or code.
    pub bank_name: String,
    /// Account number.
    pub account_number: String,
    /// Account holder, if known.
    pub account_holder: Option<String>,
}

impl TryFrom<BankInfo> for ReceivingAccount {
    type Error = AppError;

    fn try_from(bank: BankInfo) -> AppResult<Self> {
        match (bank.bank_name, bank.account_number) {
            (Some(bank_name), Some(account_number)) => Ok(Self {
                bank_name,
                account_number,
                account_holder: bank.account_holder,
            }),
            _ => Err(AppError::InvalidInput(
                "bank name and account number are required".into(),
            )),
        }
    }
}

/// A rendered payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    /// Link to the rendered transfer code.
    pub url: String,
    /// Account the money goes to.
    pub account: ReceivingAccount,
    /// Amount encoded in the link.
    pub amount: Decimal,
    /// Transfer note.
    pub content: String,
}

/// Renders payment links. Implementations must be pure.
pub trait PaymentLinkRenderer: Send + Sync {
    /// Builds the link for `amount` into `account` with the note `content`.
    fn render(&self, account: &ReceivingAccount, amount: Decimal, content: &str) -> String;
}

/// Quick-link renderer for image services addressed as
/// `{base}/{bank}-{account}-compact2.png?amount=..&addInfo=..&accountName=..`.
#[derive(Debug, Clone)]
pub struct QuickLinkRenderer {
    base_url: String,
}

impl QuickLinkRenderer {
    /// Creates a renderer for the given image service base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl PaymentLinkRenderer for QuickLinkRenderer {
    fn render(&self, account: &ReceivingAccount, amount: Decimal, content: &str) -> String {
        let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        format!(
            "{}/{}-{}-compact2.png?amount={}&addInfo={}&accountName={}",
            self.base_url,
            query_escape(&account.bank_name),
            query_escape(&account.account_number),
            whole,
            query_escape(content),
            query_escape(account.account_holder.as_deref().unwrap_or_default()),
        )
    }
}

/// Transfer note for an event payment.
#[must_use]
pub fn transfer_note(event_name: &str) -> String {
    format!("Payment for event {event_name}")
}

/// Builds a payment link after validating the amount.
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive amount.
pub fn build_link(
    renderer: &dyn PaymentLinkRenderer,
    account: ReceivingAccount,
    amount: Decimal,
    event_name: &str,
) -> AppResult<PaymentLink> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidInput(format!(
            "payment amount must be positive, got {amount}"
        )));
    }
    let content = transfer_note(event_name);
    Ok(PaymentLink {
        url: renderer.render(&account, amount, &content),
        account,
        amount,
        content,
    })
}

/// `application/x-www-form-urlencoded` escaping: space becomes `+`.
fn query_escape(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes()).collect()
}
