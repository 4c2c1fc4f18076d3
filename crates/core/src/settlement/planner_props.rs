//! Property-based tests for the settlement planner.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BALANCE_TOLERANCE, ParticipantId};
use uuid::Uuid;

use crate::settlement::planner::SettlementPlanner;

fn pid(n: u8) -> ParticipantId {
    ParticipantId::from_uuid(Uuid::from_u128(u128::from(n) + 1))
}

/// Zero-sum balances built from random debts between up to 8 participants.
///
/// Debts are multiples of 0.05 so every non-zero net balance is clear of the
/// settlement tolerance.
fn arb_balances() -> impl Strategy<Value = Vec<(ParticipantId, Decimal)>> {
    proptest::collection::vec((0u8..8, 0u8..8, 1i64..200_000i64), 0..20).prop_map(|debts| {
        let mut net: HashMap<ParticipantId, Decimal> = HashMap::new();
        for (from, to, units) in debts {
            if from == to {
                continue;
            }
            let amount = Decimal::new(units * 5, 2);
            *net.entry(pid(from)).or_default() -= amount;
            *net.entry(pid(to)).or_default() += amount;
        }
        net.into_iter().collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 3: Applying the plan settles everyone
    // =========================================================================

    #[test]
    fn prop_plan_settles_all_balances(balances in arb_balances()) {
        let transfers = SettlementPlanner::plan(balances.clone());

        let mut remaining: HashMap<ParticipantId, Decimal> = balances.iter().copied().collect();
        for t in &transfers {
            *remaining.entry(t.from).or_default() += t.amount;
            *remaining.entry(t.to).or_default() -= t.amount;
        }

        for (id, left) in remaining {
            prop_assert!(left.abs() <= BALANCE_TOLERANCE, "{} left with {}", id, left);
        }
    }

    // =========================================================================
    // Property 4: Transfer total equals total credit equals total debt
    // =========================================================================

    #[test]
    fn prop_transfer_total_matches_credit_and_debt(balances in arb_balances()) {
        let transfers = SettlementPlanner::plan(balances.clone());

        let moved: Decimal = transfers.iter().map(|t| t.amount).sum();
        let credit: Decimal = balances.iter().map(|(_, b)| *b).filter(|b| *b > Decimal::ZERO).sum();
        let debt: Decimal = balances.iter().map(|(_, b)| *b).filter(|b| *b < Decimal::ZERO).map(|b| -b).sum();

        prop_assert_eq!(moved, credit);
        prop_assert_eq!(moved, debt);
    }

    // =========================================================================
    // Property 5: Plan shape
    // =========================================================================

    #[test]
    fn prop_plan_shape(balances in arb_balances()) {
        let transfers = SettlementPlanner::plan(balances.clone());

        let sign: HashMap<ParticipantId, Decimal> = balances.iter().copied().collect();
        let debtors = sign.values().filter(|b| **b < -BALANCE_TOLERANCE).count();
        let creditors = sign.values().filter(|b| **b > BALANCE_TOLERANCE).count();

        prop_assert!(transfers.len() <= (debtors + creditors).saturating_sub(1));
        for t in &transfers {
            prop_assert!(t.amount > BALANCE_TOLERANCE);
            prop_assert_ne!(t.from, t.to);
            prop_assert!(sign[&t.from] < Decimal::ZERO);
            prop_assert!(sign[&t.to] > Decimal::ZERO);
        }
    }

    #[test]
    fn prop_plan_is_order_independent(balances in arb_balances()) {
        let mut reversed = balances.clone();
        reversed.reverse();

        prop_assert_eq!(SettlementPlanner::plan(balances), SettlementPlanner::plan(reversed));
    }
}
