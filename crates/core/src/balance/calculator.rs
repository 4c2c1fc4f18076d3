//! Balance calculator.
//!
//! For participant `p`:
//! `balance(p) = (paid(p) - share(p)) + (sent(p) - received(p))`.
//! A positive balance means the group owes `p`; negative means `p` owes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tally_shared::types::{AMOUNT_SCALE, ParticipantId};

use crate::allocation::Allocation;
use crate::balance::types::{ExpenseRecord, ParticipantBalance, SettlementRecord};

fn slot(
    totals: &mut BTreeMap<ParticipantId, ParticipantBalance>,
    id: ParticipantId,
) -> &mut ParticipantBalance {
    totals
        .entry(id)
        .or_insert_with(|| ParticipantBalance::zero(id))
}

/// Stateless balance computation over ledger records.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Beneficiary shares of one expense.
    ///
    /// Shares are `total * ratio` at [`AMOUNT_SCALE`] digits, allocated with the
    /// largest remainder method so they sum exactly to the total.
    #[must_use]
    pub fn beneficiary_shares(expense: &ExpenseRecord) -> Vec<(ParticipantId, Decimal)> {
        let ratios: Vec<Decimal> = expense.beneficiaries.iter().map(|b| b.ratio).collect();
        let shares = Allocation::by_weights(expense.total, &ratios, AMOUNT_SCALE);

        expense
            .beneficiaries
            .iter()
            .map(|b| b.participant_id)
            .zip(shares)
            .collect()
    }

    /// Computes balances for every participant.
    ///
    /// The output follows the order of `participants`. Ids referenced by the
    /// ledger but missing from `participants` are appended in id order so
    /// the result always nets to zero.
    #[must_use]
    pub fn compute(
        participants: &[ParticipantId],
        expenses: &[ExpenseRecord],
        settlements: &[SettlementRecord],
    ) -> Vec<ParticipantBalance> {
        let mut totals: BTreeMap<ParticipantId, ParticipantBalance> = participants
            .iter()
            .map(|id| (*id, ParticipantBalance::zero(*id)))
            .collect();

        for expense in expenses {
            for payer in &expense.payers {
                slot(&mut totals, payer.participant_id).total_paid += payer.amount;
            }
            for (participant_id, share) in Self::beneficiary_shares(expense) {
                slot(&mut totals, participant_id).total_share += share;
            }
        }

        for settlement in settlements {
            slot(&mut totals, settlement.payer_id).settled_sent += settlement.amount;
            slot(&mut totals, settlement.receiver_id).settled_received += settlement.amount;
        }

        for balance in totals.values_mut() {
            balance.balance = (balance.total_paid - balance.total_share)
                + (balance.settled_sent - balance.settled_received);
        }

        let mut ordered = Vec::with_capacity(totals.len());
        for id in participants {
            if let Some(balance) = totals.remove(id) {
                ordered.push(balance);
            }
        }
        ordered.extend(totals.into_values());
        ordered
    }

    /// Balance of a single participant, zero if it has no ledger activity.
    #[must_use]
    pub fn balance_of(
        participant_id: ParticipantId,
        expenses: &[ExpenseRecord],
        settlements: &[SettlementRecord],
    ) -> Decimal {
        Self::compute(&[participant_id], expenses, settlements)
            .into_iter()
            .find(|b| b.participant_id == participant_id)
            .map_or(Decimal::ZERO, |b| b.balance)
    }
}
