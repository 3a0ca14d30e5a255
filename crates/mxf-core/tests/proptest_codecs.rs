//! Property-based tests for the byte codecs.
//!
//! These verify the codecs never panic on arbitrary input and that the
//! BER round-trip property from spec.md §8 holds.

use mxf_core::length;
use proptest::prelude::*;

proptest! {
    /// BER decode should never panic on arbitrary bytes.
    #[test]
    fn ber_decode_no_panic(data in prop::collection::vec(any::<u8>(), 0..16)) {
        let _ = length::decode_ber(&data);
    }

    /// Fixed-width decode should never panic on arbitrary bytes/width.
    #[test]
    fn fixed_decode_no_panic(data in prop::collection::vec(any::<u8>(), 0..8), width in 0u8..8) {
        let _ = length::decode_fixed(&data, width);
    }

    #[test]
    fn ber_min_width_round_trip(len in 0u64..length::MAX_LENGTH) {
        let enc = length::encode_ber_min(len);
        let (dec, consumed) = length::decode_ber(&enc).unwrap();
        prop_assert_eq!(dec, len);
        prop_assert_eq!(consumed, enc.len());
    }
}
