//! Property-based checks for the EEPROM checksum format, mirroring the
//! placement and style of the cryptography crate's
//! `tests/property_based_crypto_tests.rs`.

use neonucleus_backends::crc;
use proptest::prelude::*;

proptest! {
    /// The checksum is a pure function of its two inputs: hashing the same
    /// `(data, code)` pair twice always yields the same 8-character hex
    /// string.
    #[test]
    fn checksum_is_deterministic(
        data in proptest::collection::vec(any::<u8>(), 0..512),
        code in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let first = crc::checksum(&data, &code);
        let second = crc::checksum(&data, &code);
        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(first.len(), 8);
        prop_assert!(first.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }
}
