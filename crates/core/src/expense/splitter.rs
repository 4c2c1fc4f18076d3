//! Expense splitter.
//!
//! Payers share the total equally. Beneficiaries carry caller-supplied
//! weights that are normalized into ratios summing to exactly 1; only the
//! ratios are persisted.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AMOUNT_SCALE, ParticipantId, RATIO_SCALE};
use tally_shared::types::money::{MAX_AMOUNT, fits_amount_scale};

use crate::allocation::Allocation;
use crate::balance::{BeneficiaryLine, PayerLine};
use crate::expense::error::SplitError;

/// Caller-supplied weight for one beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryWeight {
    /// Benefiting participant.
    pub participant_id: ParticipantId,
    /// Relative weight, non-negative.
    pub weight: Decimal,
}

/// An expense as submitted, before validation.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Free-text description.
    pub description: String,
    /// Total amount.
    pub total: Decimal,
    /// Participants who paid, in display order.
    pub payer_ids: Vec<ParticipantId>,
    /// Participants who benefit and their weights.
    pub beneficiaries: Vec<BeneficiaryWeight>,
}

/// Validated breakdown ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    /// Trimmed description.
    pub description: String,
    /// Total amount.
    pub total: Decimal,
    /// Equal payer contributions, summing exactly to `total`.
    pub payers: Vec<PayerLine>,
    /// Normalized ratios, summing exactly to 1.
    pub beneficiaries: Vec<BeneficiaryLine>,
}

/// Stateless expense validation and split computation.
pub struct ExpenseSplitter;

impl ExpenseSplitter {
    /// Maximum description length in characters.
    pub const MAX_DESCRIPTION_LEN: usize = 255;

    /// Largest accepted beneficiary weight.
    pub const MAX_WEIGHT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

    /// Validates `draft` and computes its breakdown.
    ///
    /// `is_member` reports whether a participant id belongs to the event
    /// (and is still active in it).
    ///
    /// # Errors
    ///
    /// Returns a `SplitError` describing the first rule the draft breaks.
    pub fn split<F>(draft: &ExpenseDraft, is_member: F) -> Result<SplitPlan, SplitError>
    where
        F: Fn(ParticipantId) -> bool,
    {
        if draft.total <= Decimal::ZERO {
            return Err(SplitError::NonPositiveTotal(draft.total));
        }
        if !fits_amount_scale(draft.total) {
            return Err(SplitError::TooPrecise(draft.total));
        }
        if draft.total > MAX_AMOUNT {
            return Err(SplitError::TooLarge(draft.total));
        }

        let description = draft.description.trim();
        if description.is_empty() {
            return Err(SplitError::EmptyDescription);
        }
        if description.chars().count() > Self::MAX_DESCRIPTION_LEN {
            return Err(SplitError::DescriptionTooLong {
                max: Self::MAX_DESCRIPTION_LEN,
            });
        }

        if draft.payer_ids.is_empty() {
            return Err(SplitError::NoPayers);
        }
        if draft.beneficiaries.is_empty() {
            return Err(SplitError::NoBeneficiaries);
        }

        let mut seen = HashSet::new();
        for id in &draft.payer_ids {
            if !seen.insert(*id) {
                return Err(SplitError::DuplicatePayer(*id));
            }
        }

        let mut seen = HashSet::new();
        for b in &draft.beneficiaries {
            if !seen.insert(b.participant_id) {
                return Err(SplitError::DuplicateBeneficiary(b.participant_id));
            }
            if b.weight < Decimal::ZERO {
                return Err(SplitError::NegativeWeight(b.participant_id));
            }
            if b.weight > Self::MAX_WEIGHT {
                return Err(SplitError::WeightTooLarge {
                    participant: b.participant_id,
                    max: Self::MAX_WEIGHT,
                });
            }
        }

        let weights: Vec<Decimal> = draft.beneficiaries.iter().map(|b| b.weight).collect();
        let weight_sum = weights
            .iter()
            .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(*w));
        if weight_sum.is_none_or(|sum| sum <= Decimal::ZERO) {
            return Err(SplitError::NonPositiveWeightSum);
        }

        let referenced = draft
            .payer_ids
            .iter()
            .chain(draft.beneficiaries.iter().map(|b| &b.participant_id));
        for id in referenced {
            if !is_member(*id) {
                return Err(SplitError::UnknownParticipant(*id));
            }
        }

        let amounts = Allocation::equal(draft.total, draft.payer_ids.len(), AMOUNT_SCALE);
        let ratios = Allocation::by_weights(Decimal::ONE, &weights, RATIO_SCALE);

        Ok(SplitPlan {
            description: description.to_string(),
            total: draft.total,
            payers: draft
                .payer_ids
                .iter()
                .zip(amounts)
                .map(|(id, amount)| PayerLine {
                    participant_id: *id,
                    amount,
                })
                .collect(),
            beneficiaries: draft
                .beneficiaries
                .iter()
                .zip(ratios)
                .map(|(b, ratio)| BeneficiaryLine {
                    participant_id: b.participant_id,
                    ratio,
                })
                .collect(),
        })
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

    fn weight(n: u128, w: Decimal) -> BeneficiaryWeight {
        BeneficiaryWeight {
            participant_id: pid(n),
            weight: w,
        }
    }

    fn draft(total: Decimal, payers: &[u128], beneficiaries: Vec<BeneficiaryWeight>) -> ExpenseDraft {
        ExpenseDraft {
            description: "Dinner".to_string(),
            total,
            payer_ids: payers.iter().map(|p| pid(*p)).collect(),
            beneficiaries,
        }
    }

    fn members(id: ParticipantId) -> bool {
        id.into_inner().as_u128() <= 3
    }

    #[test]
    fn test_equal_three_way_split() {
        let plan = ExpenseSplitter::split(
            &draft(dec!(300), &[1], vec![weight(1, dec!(1)), weight(2, dec!(1)), weight(3, dec!(1))]),
            members,
        )
        .unwrap();

        assert_eq!(plan.payers.len(), 1);
        assert_eq!(plan.payers[0].amount, dec!(300));
        assert_eq!(plan.beneficiaries.iter().map(|b| b.ratio).sum::<Decimal>(), Decimal::ONE);
        assert_eq!(plan.beneficiaries[1].ratio, dec!(0.3333333333));
    }

    #[test]
    fn test_payers_split_equally_and_sum_to_total() {
        let plan = ExpenseSplitter::split(
            &draft(dec!(100), &[1, 2, 3], vec![weight(1, dec!(1))]),
            members,
        )
        .unwrap();

        let amounts: Vec<Decimal> = plan.payers.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![dec!(33.3334), dec!(33.3333), dec!(33.3333)]);
        assert_eq!(amounts.iter().copied().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_weighted_ratios() {
        let plan = ExpenseSplitter::split(
            &draft(dec!(90), &[1], vec![weight(2, dec!(2)), weight(3, dec!(1))]),
            members,
        )
        .unwrap();

        assert_eq!(plan.beneficiaries[0].ratio, dec!(0.6666666667));
        assert_eq!(plan.beneficiaries[1].ratio, dec!(0.3333333333));
    }

    #[test]
    fn test_description_is_trimmed() {
        let mut d = draft(dec!(10), &[1], vec![weight(1, dec!(1))]);
        d.description = "  Taxi  ".to_string();
        assert_eq!(ExpenseSplitter::split(&d, members).unwrap().description, "Taxi");
    }

    #[test]
    fn test_rejects_non_positive_total() {
        for total in [dec!(0), dec!(-5)] {
            let err = ExpenseSplitter::split(&draft(total, &[1], vec![weight(1, dec!(1))]), members)
                .unwrap_err();
            assert_eq!(err, SplitError::NonPositiveTotal(total));
        }
    }

    #[test]
    fn test_rejects_too_precise_total() {
        let err = ExpenseSplitter::split(&draft(dec!(10.00001), &[1], vec![weight(1, dec!(1))]), members)
            .unwrap_err();
        assert_eq!(err.error_code(), "AMOUNT_TOO_PRECISE");
    }

    #[test]
    fn test_rejects_empty_lists() {
        assert_eq!(
            ExpenseSplitter::split(&draft(dec!(10), &[], vec![weight(1, dec!(1))]), members),
            Err(SplitError::NoPayers)
        );
        assert_eq!(
            ExpenseSplitter::split(&draft(dec!(10), &[1], vec![]), members),
            Err(SplitError::NoBeneficiaries)
        );
    }

    #[test]
    fn test_rejects_blank_description() {
        let mut d = draft(dec!(10), &[1], vec![weight(1, dec!(1))]);
        d.description = "   ".to_string();
        assert_eq!(ExpenseSplitter::split(&d, members), Err(SplitError::EmptyDescription));
    }

    #[test]
    fn test_rejects_bad_weights() {
        assert_eq!(
            ExpenseSplitter::split(
                &draft(dec!(10), &[1], vec![weight(1, dec!(0)), weight(2, dec!(0))]),
                members
            ),
            Err(SplitError::NonPositiveWeightSum)
        );
        assert_eq!(
            ExpenseSplitter::split(
                &draft(dec!(10), &[1], vec![weight(1, dec!(2)), weight(2, dec!(-1))]),
                members
            ),
            Err(SplitError::NegativeWeight(pid(2)))
        );
    }

    #[test]
    fn test_rejects_oversized_total() {
        assert_eq!(
            ExpenseSplitter::split(&draft(MAX_AMOUNT, &[1], vec![weight(1, dec!(1))]), members)
                .map(|plan| plan.total),
            Ok(MAX_AMOUNT)
        );

        let total = dec!(10000000000000000);
        let err = ExpenseSplitter::split(&draft(total, &[1], vec![weight(1, dec!(1))]), members)
            .unwrap_err();
        assert_eq!(err, SplitError::TooLarge(total));
        assert_eq!(tally_shared::AppError::from(err).error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_rejects_huge_weights_without_overflow() {
        let err = ExpenseSplitter::split(
            &draft(dec!(10), &[1], vec![weight(1, Decimal::MAX), weight(2, Decimal::MAX)]),
            members,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SplitError::WeightTooLarge {
                participant: pid(1),
                max: ExpenseSplitter::MAX_WEIGHT,
            }
        );
        assert_eq!(tally_shared::AppError::from(err).error_code(), "INVALID_INPUT");

        let plan = ExpenseSplitter::split(
            &draft(
                dec!(10),
                &[1],
                vec![weight(1, ExpenseSplitter::MAX_WEIGHT), weight(2, ExpenseSplitter::MAX_WEIGHT)],
            ),
            members,
        )
        .unwrap();
        assert_eq!(plan.beneficiaries[0].ratio, dec!(0.5));
    }

    #[test]
    fn test_rejects_duplicates() {
        assert_eq!(
            ExpenseSplitter::split(&draft(dec!(10), &[1, 1], vec![weight(1, dec!(1))]), members),
            Err(SplitError::DuplicatePayer(pid(1)))
        );
        assert_eq!(
            ExpenseSplitter::split(
                &draft(dec!(10), &[1], vec![weight(2, dec!(1)), weight(2, dec!(3))]),
                members
            ),
            Err(SplitError::DuplicateBeneficiary(pid(2)))
        );
    }

    #[test]
    fn test_rejects_unknown_participant() {
        assert_eq!(
            ExpenseSplitter::split(&draft(dec!(10), &[7], vec![weight(1, dec!(1))]), members),
            Err(SplitError::UnknownParticipant(pid(7)))
        );
        assert_eq!(
            ExpenseSplitter::split(&draft(dec!(10), &[1], vec![weight(9, dec!(1))]), members),
            Err(SplitError::UnknownParticipant(pid(9)))
        );
    }
}
