//! Property-based tests for the balance calculator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AMOUNT_SCALE, ParticipantId, RATIO_SCALE};
use uuid::Uuid;

use crate::allocation::Allocation;
use crate::balance::calculator::BalanceCalculator;
use crate::balance::types::{BeneficiaryLine, ExpenseRecord, PayerLine, SettlementRecord};

const PARTICIPANTS: u128 = 6;

fn pid(n: u128) -> ParticipantId {
    ParticipantId::from_uuid(Uuid::from_u128(n + 1))
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// An expense built the same way the splitter builds one.
fn arb_expense() -> impl Strategy<Value = ExpenseRecord> {
    (
        arb_amount(),
        proptest::sample::subsequence((0..PARTICIPANTS).collect::<Vec<_>>(), 1..=6),
        proptest::collection::vec((0..PARTICIPANTS, 1i64..20i64), 1..=6),
    )
        .prop_map(|(total, payers, raw_beneficiaries)| {
            let mut beneficiaries: Vec<(u128, i64)> = Vec::new();
            for (p, w) in raw_beneficiaries {
                if !beneficiaries.iter().any(|(q, _)| *q == p) {
                    beneficiaries.push((p, w));
                }
            }

            let amounts = Allocation::equal(total, payers.len(), AMOUNT_SCALE);
            let weights: Vec<Decimal> = beneficiaries.iter().map(|(_, w)| Decimal::from(*w)).collect();
            let ratios = Allocation::by_weights(Decimal::ONE, &weights, RATIO_SCALE);

            ExpenseRecord {
                total,
                payers: payers
                    .iter()
                    .zip(amounts)
                    .map(|(p, amount)| PayerLine {
                        participant_id: pid(*p),
                        amount,
                    })
                    .collect(),
                beneficiaries: beneficiaries
                    .iter()
                    .zip(ratios)
                    .map(|((p, _), ratio)| BeneficiaryLine {
                        participant_id: pid(*p),
                        ratio,
                    })
                    .collect(),
            }
        })
}

fn arb_settlement() -> impl Strategy<Value = SettlementRecord> {
    (0..PARTICIPANTS, 1..PARTICIPANTS, arb_amount()).prop_map(|(payer, offset, amount)| {
        SettlementRecord {
            payer_id: pid(payer),
            receiver_id: pid((payer + offset) % PARTICIPANTS),
            amount,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Zero-sum
    // Every expense pays out exactly what it charges and every settlement is a
    // transfer, so balances across an event always net to zero.
    // =========================================================================

    #[test]
    fn prop_balances_net_to_zero(
        expenses in proptest::collection::vec(arb_expense(), 0..12),
        settlements in proptest::collection::vec(arb_settlement(), 0..12),
    ) {
        let participants: Vec<ParticipantId> = (0..PARTICIPANTS).map(pid).collect();
        let balances = BalanceCalculator::compute(&participants, &expenses, &settlements);

        let sum: Decimal = balances.iter().map(|b| b.balance).sum();
        prop_assert_eq!(sum, Decimal::ZERO);
        prop_assert_eq!(balances.len(), participants.len());
    }

    // =========================================================================
    // Property 2: Shares reconstruct from ratios
    // =========================================================================

    #[test]
    fn prop_shares_match_ratio_times_total(expense in arb_expense()) {
        let shares = BalanceCalculator::beneficiary_shares(&expense);
        let unit = Decimal::new(1, AMOUNT_SCALE);

        let share_sum: Decimal = shares.iter().map(|(_, s)| *s).sum();
        prop_assert_eq!(share_sum, expense.total);

        for (line, (_, share)) in expense.beneficiaries.iter().zip(shares.iter()) {
            let exact = expense.total * line.ratio;
            prop_assert!((exact - *share).abs() <= unit, "share {} vs exact {}", share, exact);
        }
    }

    #[test]
    fn prop_balance_components_are_consistent(
        expenses in proptest::collection::vec(arb_expense(), 0..6),
        settlements in proptest::collection::vec(arb_settlement(), 0..6),
    ) {
        let participants: Vec<ParticipantId> = (0..PARTICIPANTS).map(pid).collect();
        for b in BalanceCalculator::compute(&participants, &expenses, &settlements) {
            prop_assert_eq!(
                b.balance,
                (b.total_paid - b.total_share) + (b.settled_sent - b.settled_received)
            );
        }
    }
}
