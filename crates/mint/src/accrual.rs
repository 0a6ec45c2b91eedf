//! Per-second compounding accrual.

use num_bigint::BigUint;
use tollgate_types::Dec;

/// Result of accruing over one block interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    /// Whole units to mint this block.
    pub minted: BigUint,
    /// Fraction carried into the next block, in `[0, 1)`.
    pub leftover: Dec,
}

/// Accrue `elapsed_seconds` of inflation on top of `supply`.
///
/// Each second's increment is `estimate * rate`, truncated, and is added
/// both to the amount owed and to the running estimate, so later seconds
/// compound on earlier ones. `leftover` seeds the amount owed.
pub fn accrue(supply: &BigUint, rate: &Dec, leftover: &Dec, elapsed_seconds: u64) -> Accrual {
    let mut estimate = Dec::from_int(supply.clone());
    let mut owed = leftover.clone();

    if !rate.is_zero() {
        for _ in 0..elapsed_seconds {
            let increment = estimate.mul_truncate(rate);
            if increment.is_zero() {
                // estimate is fixed from here on, so every further second adds nothing
                break;
            }
            owed = owed.add(&increment);
            estimate = estimate.add(&increment);
        }
    }

    Accrual {
        minted: owed.floor(),
        leftover: owed.fract(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> Dec {
        s.parse().unwrap()
    }

    /// Independent u128 fixed-point model of the same loop.
    fn reference(supply: u64, rate_atomics: u128, leftover_atomics: u128, n: u64) -> (u128, u128) {
        const ONE: u128 = 1_000_000_000_000_000_000;
        let mut estimate = supply as u128 * ONE;
        let mut owed = leftover_atomics;
        for _ in 0..n {
            let inc = estimate * rate_atomics / ONE;
            owed += inc;
            estimate += inc;
        }
        (owed / ONE, owed % ONE)
    }

    #[test]
    fn compounds_on_running_estimate() {
        // 1000 at 10%/s for 2s: 100 then 110
        let a = accrue(&BigUint::from(1000u32), &d("0.1"), &Dec::zero(), 2);
        assert_eq!(a.minted, BigUint::from(210u32));
        assert!(a.leftover.is_zero());
    }

    #[test]
    fn fraction_is_carried() {
        // 10 at 0.05/s for 1s = 0.5
        let a = accrue(&BigUint::from(10u32), &d("0.05"), &Dec::zero(), 1);
        assert_eq!(a.minted, BigUint::from(0u32));
        assert_eq!(a.leftover, d("0.5"));

        let b = accrue(&BigUint::from(10u32), &d("0.05"), &a.leftover, 1);
        assert_eq!(b.minted, BigUint::from(1u32));
        assert!(b.leftover.is_zero());
    }

    #[test]
    fn zero_elapsed_returns_leftover_only() {
        let a = accrue(&BigUint::from(10u32), &d("0.5"), &d("0.75"), 0);
        assert_eq!(a.minted, BigUint::from(0u32));
        assert_eq!(a.leftover, d("0.75"));
    }

    #[test]
    fn zero_supply_or_rate_mints_nothing() {
        assert_eq!(
            accrue(&BigUint::from(0u32), &d("0.5"), &Dec::zero(), 1_000).minted,
            BigUint::from(0u32)
        );
        assert_eq!(
            accrue(&BigUint::from(1000u32), &Dec::zero(), &Dec::zero(), 1_000).minted,
            BigUint::from(0u32)
        );
    }

    proptest! {
        #[test]
        fn matches_stepwise_simulation(
            supply in 0u64..100_000,
            rate_atomics in 0u128..1_000_000_000_000_000,
            leftover_atomics in 0u128..1_000_000_000_000_000_000,
            n in 0u64..40,
        ) {
            let a = accrue(
                &BigUint::from(supply),
                &Dec::from_atomics(BigUint::from(rate_atomics)),
                &Dec::from_atomics(BigUint::from(leftover_atomics)),
                n,
            );
            let (minted, frac) = reference(supply, rate_atomics, leftover_atomics, n);
            prop_assert_eq!(a.minted, BigUint::from(minted));
            prop_assert_eq!(a.leftover.atomics(), &BigUint::from(frac));
        }

        #[test]
        fn leftover_stays_below_one(
            supply in 0u64..u64::MAX,
            rate_atomics in 0u128..1_000_000_000_000_000,
            n in 0u64..200,
        ) {
            let a = accrue(
                &BigUint::from(supply),
                &Dec::from_atomics(BigUint::from(rate_atomics)),
                &Dec::zero(),
                n,
            );
            prop_assert!(a.leftover.is_below_one());
        }
    }
}
