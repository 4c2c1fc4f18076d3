//! Bank routing details attached to users, participants and collectors.

use serde::{Deserialize, Serialize};

/// Optional bank routing triple.
///
/// Every field is independently optional. Blank strings are not a valid
/// "no value" marker; use [`BankInfo::normalized`] on caller input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    /// Bank name or bank code.
    pub bank_name: Option<String>,
    /// Account number at the bank.
    pub account_number: Option<String>,
    /// Name of the account holder.
    pub account_holder: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BankInfo {
    /// Builds bank info, turning blank strings into absent values.
    #[must_use]
    pub fn new(
        bank_name: Option<String>,
        account_number: Option<String>,
        account_holder: Option<String>,
    ) -> Self {
        Self {
            bank_name: clean(bank_name),
            account_number: clean(account_number),
            account_holder: clean(account_holder),
        }
    }

    /// Trims every field and drops blank ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.bank_name, self.account_number, self.account_holder)
    }

    /// True when all three fields are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.bank_name.is_some() && self.account_number.is_some() && self.account_holder.is_some()
    }

    /// True when money can be routed here: bank and account number present.
    #[must_use]
    pub const fn can_receive(&self) -> bool {
        self.bank_name.is_some() && self.account_number.is_some()
    }

    /// True when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bank_name.is_none() && self.account_number.is_none() && self.account_holder.is_none()
    }

    /// Fills each absent field from `fallback`, field by field.
    #[must_use]
    pub fn or_fields_from(self, fallback: &Self) -> Self {
        Self {
            bank_name: self.bank_name.or_else(|| fallback.bank_name.clone()),
            account_number: self.account_number.or_else(|| fallback.account_number.clone()),
            account_holder: self.account_holder.or_else(|| fallback.account_holder.clone()),
        }
    }
}
