//! Event domain types and rules.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CurrencyCode, UserId};

use crate::event::error::EventError;
use crate::settlement::average_per_person;

/// Event status. Events only ever move from active to closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Accepting expenses and participants.
    Active,
    /// Frozen; only settling up continues.
    Closed,
}

impl EventStatus {
    /// Returns the stored string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    /// True while expenses and membership may change.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(EventError::UnknownStatus(other.to_string())),
        }
    }
}

/// Validated event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Trimmed name.
    pub name: String,
    /// Trimmed description, absent when blank.
    pub description: Option<String>,
    /// Currency code.
    pub currency: CurrencyCode,
}

/// Headline numbers for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    /// Active participants.
    pub total_participants: usize,
    /// Number of expenses.
    pub total_transactions: usize,
    /// Sum of expense totals.
    pub total_expenses: Decimal,
    /// Total per active participant.
    pub average_per_person: Decimal,
}

impl EventStats {
    /// Computes stats from participant count and expense totals.
    #[must_use]
    pub fn compute(participants: usize, expense_totals: &[Decimal]) -> Self {
        let total: Decimal = expense_totals.iter().copied().sum();
        Self {
            total_participants: participants,
            total_transactions: expense_totals.len(),
            total_expenses: total,
            average_per_person: average_per_person(total, participants),
        }
    }
}

/// Stateless event rules.
pub struct EventService;

impl EventService {
    /// Maximum name length in characters.
    pub const MAX_NAME_LEN: usize = 100;
    /// Maximum description length in characters.
    pub const MAX_DESCRIPTION_LEN: usize = 1000;

    /// Validates a new event.
    ///
    /// # Errors
    ///
    /// Returns `EventError` for a blank/long name, long description or bad currency.
    pub fn validate_new(
        name: &str,
        description: Option<&str>,
        currency: &str,
    ) -> Result<EventDraft, EventError> {
        let currency = currency
            .parse::<CurrencyCode>()
            .map_err(|e| EventError::InvalidCurrency(e.to_string()))?;
        Ok(EventDraft {
            name: Self::validate_name(name)?,
            description: Self::validate_description(description)?,
            currency,
        })
    }

    /// Trims and checks a name.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` or `NameTooLong`.
    pub fn validate_name(name: &str) -> Result<String, EventError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EventError::EmptyName);
        }
        if name.chars().count() > Self::MAX_NAME_LEN {
            return Err(EventError::NameTooLong {
                max: Self::MAX_NAME_LEN,
            });
        }
        Ok(name.to_string())
    }

    /// Trims a description; blank becomes absent.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionTooLong`.
    pub fn validate_description(description: Option<&str>) -> Result<Option<String>, EventError> {
        let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        if description.chars().count() > Self::MAX_DESCRIPTION_LEN {
            return Err(EventError::DescriptionTooLong {
                max: Self::MAX_DESCRIPTION_LEN,
            });
        }
        Ok(Some(description.to_string()))
    }

    /// Checks a status change. Re-applying the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any attempt to reopen.
    pub fn transition(from: EventStatus, to: EventStatus) -> Result<EventStatus, EventError> {
        match (from, to) {
            (EventStatus::Active, _) | (EventStatus::Closed, EventStatus::Closed) => Ok(to),
            (EventStatus::Closed, EventStatus::Active) => {
                Err(EventError::InvalidTransition { from, to })
            }
        }
    }

    /// Only the creator manages the event itself.
    ///
    /// # Errors
    ///
    /// Returns `NotCreator` naming the attempted action.
    pub fn ensure_creator(
        requester: UserId,
        creator: UserId,
        action: &'static str,
    ) -> Result<(), EventError> {
        if requester == creator {
            Ok(())
        } else {
            Err(EventError::NotCreator(action))
        }
    }

    /// Expenses and new members are only accepted while the event is open.
    ///
    /// # Errors
    ///
    /// Returns `Closed`.
    pub fn ensure_open(status: EventStatus) -> Result<(), EventError> {
        if status.is_open() {
            Ok(())
        } else {
            Err(EventError::Closed)
        }
    }
}
