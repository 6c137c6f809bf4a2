//! Property-based tests for proportional spend distribution.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::SpendAllocation;

/// Strategy for actual spend amounts (0.00 to 1,000,000.00).
fn spend_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for sub-aim budget weights, zero included.
fn weights() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((0i64..10_000_000i64).prop_map(|c| Decimal::new(c, 2)), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Shares sum back to the rounded total within one unit per sub-aim.
    #[test]
    fn prop_shares_sum_within_count_units(total in spend_amount(), weights in weights()) {
        let shares = SpendAllocation::distribute(total, &weights);
        prop_assert_eq!(shares.len(), weights.len());

        let weight_sum: Decimal = weights.iter().copied().sum();
        let sum: Decimal = shares.iter().copied().sum();
        if weight_sum.is_zero() {
            prop_assert_eq!(sum, Decimal::ZERO);
        } else {
            let drift = (sum - SpendAllocation::round_unit(total)).abs();
            prop_assert!(drift <= Decimal::from(weights.len()));
        }
    }

    /// Every share is a whole unit and never negative for non-negative input.
    #[test]
    fn prop_shares_are_whole_units(total in spend_amount(), weights in weights()) {
        for share in SpendAllocation::distribute(total, &weights) {
            prop_assert!(share >= Decimal::ZERO);
            prop_assert_eq!(share, share.trunc());
        }
    }

    /// Larger weights never receive smaller shares.
    #[test]
    fn prop_shares_monotone_in_weight(total in spend_amount(), weights in weights()) {
        let shares = SpendAllocation::distribute(total, &weights);
        for i in 0..weights.len() {
            for j in 0..weights.len() {
                if weights[i] > weights[j] {
                    prop_assert!(shares[i] >= shares[j]);
                }
            }
        }
    }
}
