//! Event summary: balances, settlement instructions and totals.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AMOUNT_SCALE, ParticipantId};

use crate::balance::{BalanceType, ParticipantBalance};
use crate::settlement::planner::SettlementPlanner;

/// What a participant has to do to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementAction {
    /// Waits to receive money.
    Receive,
    /// Has to pay.
    Pay,
    /// Nothing left to do.
    None,
}

impl From<BalanceType> for SettlementAction {
    fn from(balance_type: BalanceType) -> Self {
        match balance_type {
            BalanceType::Credit => Self::Receive,
            BalanceType::Debit => Self::Pay,
            BalanceType::Settled => Self::None,
        }
    }
}

/// Participant input for a summary.
#[derive(Debug, Clone)]
pub struct SummaryParticipant {
    /// Participant id.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// False once the participant left or was removed.
    pub active: bool,
}

/// One row of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    /// Participant id.
    pub participant_id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Sum paid for expenses.
    pub total_paid: Decimal,
    /// Sum of beneficiary shares.
    pub total_share: Decimal,
    /// Net balance.
    pub balance: Decimal,
    /// Credit, debit or settled.
    pub balance_type: BalanceType,
    /// Receive, pay or nothing.
    pub action: SettlementAction,
    /// Human readable instruction, e.g. `Pays 100.00`.
    pub description: String,
}

/// A planned transfer with display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTransfer {
    /// Paying participant.
    pub from_id: ParticipantId,
    /// Paying participant's name.
    pub from_name: String,
    /// Receiving participant.
    pub to_id: ParticipantId,
    /// Receiving participant's name.
    pub to_name: String,
    /// Amount to transfer.
    pub amount: Decimal,
}

/// Balances and settlement plan for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// Sum of all expense totals.
    pub total_expenses: Decimal,
    /// Number of active participants.
    pub total_participants: usize,
    /// `total_expenses / total_participants`.
    pub average_per_person: Decimal,
    /// Active participants, plus removed ones that still carry a balance.
    pub participants: Vec<ParticipantSummary>,
    /// Transfers that settle the event.
    pub transfers: Vec<PlannedTransfer>,
}

fn describe(action: SettlementAction, balance: Decimal) -> String {
    match action {
        SettlementAction::Receive => format!("Receives {:.2}", balance.abs()),
        SettlementAction::Pay => format!("Pays {:.2}", balance.abs()),
        SettlementAction::None => "All settled".to_string(),
    }
}

/// Average per active participant, zero when there is none.
#[must_use]
pub fn average_per_person(total: Decimal, participants: usize) -> Decimal {
    if participants == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(participants))
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Builds event summaries.
pub struct SummaryBuilder;

impl SummaryBuilder {
    /// Assembles a summary from balances computed by the balance calculator.
    #[must_use]
    pub fn build(
        participants: &[SummaryParticipant],
        balances: &[ParticipantBalance],
        total_expenses: Decimal,
    ) -> EventSummary {
        let known: HashMap<ParticipantId, &SummaryParticipant> =
            participants.iter().map(|p| (p.id, p)).collect();
        let name_of = |id: ParticipantId| {
            known
                .get(&id)
                .map_or_else(|| "Former participant".to_string(), |p| p.name.clone())
        };

        let rows: Vec<ParticipantSummary> = balances
            .iter()
            .filter(|b| known.get(&b.participant_id).is_some_and(|p| p.active) || !b.is_settled())
            .map(|b| {
                let balance_type = b.balance_type();
                let action = SettlementAction::from(balance_type);
                ParticipantSummary {
                    participant_id: b.participant_id,
                    name: name_of(b.participant_id),
                    total_paid: b.total_paid,
                    total_share: b.total_share,
                    balance: b.balance,
                    balance_type,
                    action,
                    description: describe(action, b.balance),
                }
            })
            .collect();

        let transfers = SettlementPlanner::plan(balances.iter().map(|b| (b.participant_id, b.balance)))
            .into_iter()
            .map(|t| PlannedTransfer {
                from_id: t.from,
                from_name: name_of(t.from),
                to_id: t.to,
                to_name: name_of(t.to),
                amount: t.amount,
            })
            .collect();

        let active = participants.iter().filter(|p| p.active).count();

        EventSummary {
            total_expenses,
            total_participants: active,
            average_per_person: average_per_person(total_expenses, active),
            participants: rows,
            transfers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn pid(n: u128) -> ParticipantId {
        ParticipantId::from_uuid(Uuid::from_u128(n))
    }

    fn person(n: u128, name: &str, active: bool) -> SummaryParticipant {
        SummaryParticipant {
            id: pid(n),
            name: name.to_string(),
            active,
        }
    }

    fn balance(n: u128, paid: Decimal, share: Decimal) -> ParticipantBalance {
        ParticipantBalance {
            total_paid: paid,
            total_share: share,
            balance: paid - share,
            ..ParticipantBalance::zero(pid(n))
        }
    }

    #[test]
    fn test_summary_for_three_way_trip() {
        let people = [person(1, "An", true), person(2, "Binh", true), person(3, "Chi", true)];
        let balances = [
            balance(1, dec!(300), dec!(100)),
            balance(2, dec!(0), dec!(100)),
            balance(3, dec!(0), dec!(100)),
        ];

        let summary = SummaryBuilder::build(&people, &balances, dec!(300));

        assert_eq!(summary.total_participants, 3);
        assert_eq!(summary.average_per_person, dec!(100));
        assert_eq!(summary.participants[0].description, "Receives 200.00");
        assert_eq!(summary.participants[0].action, SettlementAction::Receive);
        assert_eq!(summary.participants[1].description, "Pays 100.00");
        assert_eq!(summary.participants[1].balance_type, BalanceType::Debit);

        assert_eq!(summary.transfers.len(), 2);
        assert_eq!(summary.transfers[0].from_name, "Binh");
        assert_eq!(summary.transfers[0].to_name, "An");
        assert_eq!(summary.transfers[0].amount, dec!(100));
        assert_eq!(summary.transfers[1].from_name, "Chi");
    }

    #[test]
    fn test_settled_participant_says_all_settled() {
        let people = [person(1, "An", true)];
        let summary = SummaryBuilder::build(&people, &[balance(1, dec!(50), dec!(50))], dec!(50));

        assert_eq!(summary.participants[0].description, "All settled");
        assert_eq!(summary.participants[0].action, SettlementAction::None);
        assert!(summary.transfers.is_empty());
    }

    #[test]
    fn test_removed_participants_hidden_once_settled() {
        let people = [person(1, "An", true), person(2, "Gone", false)];
        let balances = [balance(1, dec!(0), dec!(0)), balance(2, dec!(0), dec!(0))];

        let summary = SummaryBuilder::build(&people, &balances, dec!(0));

        assert_eq!(summary.participants.len(), 1);
        assert_eq!(summary.total_participants, 1);
    }

    #[test]
    fn test_average_with_no_participants() {
        assert_eq!(average_per_person(dec!(100), 0), Decimal::ZERO);
        assert_eq!(average_per_person(dec!(100), 3), dec!(33.3333));
    }
}
