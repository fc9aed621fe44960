//! Property-based checks for the buffered-indirect throttle, mirroring
//! the placement and style of the cryptography crate's
//! `tests/property_based_crypto_tests.rs`.

use neonucleus_kernel::resource::IndirectThrottle;
use proptest::prelude::*;

proptest! {
    /// However a tick's charges are split up, the throttle never lets the
    /// total accepted amount exceed the per-tick allowance.
    #[test]
    fn accepted_charges_never_exceed_the_per_tick_allowance(
        allowance in 1.0f64..1000.0,
        amounts in proptest::collection::vec(0.0f64..100.0, 0..64),
    ) {
        let mut throttle = IndirectThrottle::default();
        let mut accepted = 0.0;
        for amount in amounts {
            if throttle.try_charge(0, amount, allowance) {
                accepted += amount;
            }
        }
        prop_assert!(accepted <= allowance);
    }

    /// Moving to a new tick always resets the allowance, so a charge that
    /// fits under the allowance on its own is always accepted at the start
    /// of a fresh tick.
    #[test]
    fn a_fresh_tick_always_accepts_a_charge_within_the_allowance(
        allowance in 1.0f64..1000.0,
        tick in 0u64..1000,
    ) {
        let mut throttle = IndirectThrottle::default();
        prop_assert!(throttle.try_charge(tick, allowance, allowance));
    }
}
