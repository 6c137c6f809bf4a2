//! Proportional distribution of an aim's actual spend over its sub-aims.
//!
//! Each share is rounded on its own (nearest whole unit, half away from
//! zero), so the shares can drift from the rounded total by at most one unit
//! per sub-aim. Nothing redistributes that drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Distribution utility for estimated sub-aim spend.
pub struct SpendAllocation;

impl SpendAllocation {
    /// Splits `total` in proportion to `weights`.
    ///
    /// Returns one share per weight, in order. When the weights sum to zero
    /// every share is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use grantwise_core::grant::SpendAllocation;
    ///
    /// let shares = SpendAllocation::distribute(dec!(500), &[dec!(600), dec!(400)]);
    /// assert_eq!(shares, vec![dec!(300), dec!(200)]);
    /// ```
    #[must_use]
    pub fn distribute(total: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
        let weight_sum: Decimal = weights.iter().copied().sum();
        if weight_sum.is_zero() {
            return vec![Decimal::ZERO; weights.len()];
        }

        weights
            .iter()
            .map(|w| Self::round_unit(total * *w / weight_sum))
            .collect()
    }

    /// Rounds to a whole currency unit, half away from zero.
    #[must_use]
    pub fn round_unit(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_distribute_empty() {
        assert!(SpendAllocation::distribute(dec!(100), &[]).is_empty());
    }

    #[test]
    fn test_distribute_sixty_forty() {
        let result = SpendAllocation::distribute(dec!(500), &[dec!(600), dec!(400)]);
        assert_eq!(result, vec![dec!(300), dec!(200)]);
    }

    #[test]
    fn test_distribute_zero_weights() {
        let result = SpendAllocation::distribute(dec!(500), &[dec!(0), dec!(0), dec!(0)]);
        assert_eq!(result, vec![dec!(0), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_distribute_thirds_round_each_share() {
        // 100 / 3 = 33.33 each, rounded independently
        let result = SpendAllocation::distribute(dec!(100), &[dec!(1), dec!(1), dec!(1)]);
        assert_eq!(result, vec![dec!(33), dec!(33), dec!(33)]);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(SpendAllocation::round_unit(dec!(2.5)), dec!(3));
        assert_eq!(SpendAllocation::round_unit(dec!(3.5)), dec!(4));
        assert_eq!(SpendAllocation::round_unit(dec!(-2.5)), dec!(-3));
        assert_eq!(SpendAllocation::round_unit(dec!(2.49)), dec!(2));
    }

    #[test]
    fn test_zero_weight_sibling_gets_nothing() {
        let result = SpendAllocation::distribute(dec!(900), &[dec!(0), dec!(300)]);
        assert_eq!(result, vec![dec!(0), dec!(900)]);
    }
}
