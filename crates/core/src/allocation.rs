//! Amount allocation using the Largest Remainder Method.
//!
//! Splits a total into parts at a fixed number of fractional digits so the
//! parts sum exactly to the (rounded) total:
//! 1. Compute the exact part for each recipient
//! 2. Truncate each part to the target precision
//! 3. Hand the leftover units to the parts with the largest truncated fraction
//!
//! Ties on the fraction go to the earlier recipient, so results are reproducible.

use rust_decimal::prelude::*;

/// Allocation helpers for payer contributions, ratios and beneficiary shares.
pub struct Allocation;

impl Allocation {
    /// Splits `total` into `count` equal parts.
    ///
    /// The first `remainder` parts carry one extra unit.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::allocation::Allocation;
    ///
    /// let parts = Allocation::equal(dec!(100), 3, 2);
    /// assert_eq!(parts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    #[must_use]
    pub fn equal(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        Self::by_weights(total, &vec![Decimal::ONE; count], decimal_places)
    }

    /// Splits `total` proportionally to `weights`.
    ///
    /// Negative weights count as zero. If no weight is positive every part is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::allocation::Allocation;
    ///
    /// let ratios = Allocation::by_weights(dec!(1), &[dec!(2), dec!(1)], 4);
    /// assert_eq!(ratios, vec![dec!(0.6667), dec!(0.3333)]);
    /// ```
    #[must_use]
    pub fn by_weights(total: Decimal, weights: &[Decimal], decimal_places: u32) -> Vec<Decimal> {
        if weights.is_empty() {
            return vec![];
        }

        let mut weights: Vec<Decimal> = weights.iter().map(|w| (*w).max(Decimal::ZERO)).collect();
        let weight_sum = if let Some(sum) = checked_sum(&weights) {
            sum
        } else {
            // Scaling every weight by 1/(n+1) keeps the proportions and the sum in range.
            let shrink = Decimal::from(weights.len() + 1);
            for w in &mut weights {
                *w /= shrink;
            }
            weights.iter().copied().sum()
        };
        if weight_sum <= Decimal::ZERO {
            return vec![Decimal::ZERO; weights.len()];
        }

        let unit = Decimal::new(1, decimal_places);
        let total_rounded =
            total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);

        let exact: Vec<Decimal> = weights
            .iter()
            .map(|w| {
                total_rounded
                    .checked_mul(*w)
                    .map_or_else(|| total_rounded * (*w / weight_sum), |p| p / weight_sum)
            })
            .collect();

        let mut rounded: Vec<Decimal> = exact
            .iter()
            .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
            .collect();

        let allocated: Decimal = rounded.iter().copied().sum();
        let units_left = ((total_rounded - allocated) / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_usize()
            .unwrap_or(0);

        if units_left == 0 {
            return rounded;
        }

        let mut fractions: Vec<(usize, Decimal)> = exact
            .iter()
            .zip(rounded.iter())
            .enumerate()
            .map(|(i, (e, r))| (i, *e - *r))
            .collect();

        // Stable sort keeps earlier recipients first among equal fractions.
        fractions.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, _) in fractions.iter().cycle().take(units_left) {
            rounded[*idx] += unit;
        }

        rounded
    }
}

fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}
