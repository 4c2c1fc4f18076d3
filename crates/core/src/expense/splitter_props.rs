//! Property-based tests for the expense splitter.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AMOUNT_SCALE, ParticipantId};
use uuid::Uuid;

use crate::balance::{BalanceCalculator, ExpenseRecord};
use crate::expense::splitter::{BeneficiaryWeight, ExpenseDraft, ExpenseSplitter};

fn pid(n: u128) -> ParticipantId {
    ParticipantId::from_uuid(Uuid::from_u128(n + 1))
}

fn arb_total() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn arb_weights() -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec((0i64..1_000i64).prop_map(|n| Decimal::new(n, 1)), 1..10)
        .prop_filter("weights must sum to a positive value", |w| {
            w.iter().copied().sum::<Decimal>() > Decimal::ZERO
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 6: Split round trip
    // Ratios sum to 1 and ratio * total reconstructs the weighted share.
    // =========================================================================

    #[test]
    fn prop_ratios_sum_to_one_and_reconstruct_shares(
        total in arb_total(),
        payer_count in 1usize..8,
        weights in arb_weights(),
    ) {
        let draft = ExpenseDraft {
            description: "Groceries".to_string(),
            total,
            payer_ids: (0..payer_count as u128).map(pid).collect(),
            beneficiaries: weights
                .iter()
                .enumerate()
                .map(|(i, w)| BeneficiaryWeight { participant_id: pid(i as u128), weight: *w })
                .collect(),
        };

        let plan = ExpenseSplitter::split(&draft, |_| true).unwrap();

        let ratio_sum: Decimal = plan.beneficiaries.iter().map(|b| b.ratio).sum();
        prop_assert_eq!(ratio_sum, Decimal::ONE);

        let paid: Decimal = plan.payers.iter().map(|p| p.amount).sum();
        prop_assert_eq!(paid, total);

        let weight_sum: Decimal = weights.iter().copied().sum();
        let record = ExpenseRecord {
            total,
            payers: plan.payers.clone(),
            beneficiaries: plan.beneficiaries.clone(),
        };
        let tolerance = Decimal::new(1, AMOUNT_SCALE) + total * Decimal::new(1, 9);
        for ((_, share), w) in BalanceCalculator::beneficiary_shares(&record).iter().zip(&weights) {
            let exact = total * *w / weight_sum;
            prop_assert!((exact - *share).abs() <= tolerance, "share {} vs weighted {}", share, exact);
        }
    }

    #[test]
    fn prop_unknown_participants_always_rejected(total in arb_total(), weights in arb_weights()) {
        let draft = ExpenseDraft {
            description: "Tickets".to_string(),
            total,
            payer_ids: vec![pid(0)],
            beneficiaries: weights
                .iter()
                .enumerate()
                .map(|(i, w)| BeneficiaryWeight { participant_id: pid(i as u128), weight: *w })
                .collect(),
        };

        prop_assert!(ExpenseSplitter::split(&draft, |id| id != pid(0)).is_err());
    }
}
