//! Greedy settlement planner.
//!
//! Repeatedly matches the largest outstanding debtor with the largest
//! outstanding creditor and transfers the smaller of the two amounts.
//! Ties are broken by ascending participant id, so equal input always
//! yields the same plan.
//!
//! The plan is not guaranteed to use the fewest possible transfers; finding
//! that is a bin-covering style search. The greedy pass needs at most
//! `debtors + creditors - 1` transfers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BALANCE_TOLERANCE, ParticipantId};

/// A planned payment from a debtor to a creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Debtor paying.
    pub from: ParticipantId,
    /// Creditor receiving.
    pub to: ParticipantId,
    /// Amount to transfer.
    pub amount: Decimal,
}

/// Stateless settlement planner.
pub struct SettlementPlanner;

/// Index of the largest outstanding amount, smallest id on ties.
fn largest(parties: &[(ParticipantId, Decimal)]) -> Option<usize> {
    parties
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(idx, _)| idx)
}

impl SettlementPlanner {
    /// Plans transfers that settle the given signed balances.
    ///
    /// Balances within tolerance of zero are ignored.
    pub fn plan<I>(balances: I) -> Vec<Transfer>
    where
        I: IntoIterator<Item = (ParticipantId, Decimal)>,
    {
        let mut debtors: Vec<(ParticipantId, Decimal)> = Vec::new();
        let mut creditors: Vec<(ParticipantId, Decimal)> = Vec::new();

        for (id, balance) in balances {
            if balance < -BALANCE_TOLERANCE {
                debtors.push((id, -balance));
            } else if balance > BALANCE_TOLERANCE {
                creditors.push((id, balance));
            }
        }

        let mut transfers = Vec::new();

        while let (Some(d), Some(c)) = (largest(&debtors), largest(&creditors)) {
            let amount = debtors[d].1.min(creditors[c].1);

            if amount > BALANCE_TOLERANCE {
                transfers.push(Transfer {
                    from: debtors[d].0,
                    to: creditors[c].0,
                    amount,
                });
            }

            debtors[d].1 -= amount;
            creditors[c].1 -= amount;

            if debtors[d].1 < BALANCE_TOLERANCE {
                debtors.swap_remove(d);
            }
            if creditors[c].1 < BALANCE_TOLERANCE {
                creditors.swap_remove(c);
            }
        }

        transfers
    }
}
