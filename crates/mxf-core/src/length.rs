//! Length codecs: BER variable-length and fixed-width big-endian.
//!
//! MXF frames every KLV triple's length in one of four encodings (spec
//! §4.1): BER at file scope, fixed 1/2/4-byte big-endian within local
//! sets. All four share the same `u64` domain and the same maximum of
//! 2^63 - 1.

use crate::{Error, Result};

/// Maximum length value a KLV item may declare (spec §3).
pub const MAX_LENGTH: u64 = (1u64 << 63) - 1;

/// Decode a BER length at the start of `data`.
///
/// Returns `(length, bytes_consumed)`. A first byte `< 0x80` is the
/// length directly (short form, 1 byte consumed). Otherwise the low 7
/// bits give the number of big-endian length bytes that follow.
pub fn decode_ber(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or(Error::UnexpectedEof { need: 1, have: 0 })?;

    if first < 0x80 {
        return Ok((first as u64, 1));
    }

    let n = (first & 0x7F) as usize;
    if n == 0 || n > 8 {
        return Err(Error::MalformedLength("BER length-of-length must be 1..=8"));
    }
    if data.len() < 1 + n {
        return Err(Error::UnexpectedEof { need: 1 + n, have: data.len() });
    }

    let mut buf = [0u8; 8];
    buf[8 - n..].copy_from_slice(&data[1..1 + n]);
    let value = u64::from_be_bytes(buf);
    if value > MAX_LENGTH {
        return Err(Error::MalformedLength("BER length exceeds 2^63 - 1"));
    }
    Ok((value, 1 + n))
}

/// Minimum number of BER bytes needed to encode `length`.
pub fn min_ber_width(length: u64) -> usize {
    if length < 0x80 {
        return 1;
    }
    let significant_bytes = (64 - length.leading_zeros() as usize).div_ceil(8).max(1);
    1 + significant_bytes
}

/// Encode `length` using the minimum BER width.
pub fn encode_ber_min(length: u64) -> Vec<u8> {
    encode_ber_fixed(length, 0).expect("min width always fits itself")
}

/// Encode `length` as BER using exactly `width` bytes (0 = minimum width).
///
/// Callers may request a specific width wider than the minimum; the
/// extra length-of-length bytes are zero-padded (spec §4.1: "padding
/// with leading zero bytes is legal").
pub fn encode_ber_fixed(length: u64, width: usize) -> Result<Vec<u8>> {
    if length < 0x80 && (width == 0 || width == 1) {
        return Ok(vec![length as u8]);
    }

    let min = min_ber_width(length).saturating_sub(1).max(1);
    let n = if width == 0 { min } else { width.saturating_sub(1) };
    if n < min || n > 8 {
        return Err(Error::MalformedLength("requested BER width cannot hold length"));
    }

    let full = length.to_be_bytes();
    let mut out = Vec::with_capacity(1 + n);
    out.push(0x80 | n as u8);
    out.extend_from_slice(&full[8 - n..]);
    Ok(out)
}

/// Decode a fixed-width big-endian unsigned length field.
pub fn decode_fixed(data: &[u8], width: u8) -> Result<u64> {
    let width = width as usize;
    if data.len() < width {
        return Err(Error::UnexpectedEof { need: width, have: data.len() });
    }
    let mut buf = [0u8; 8];
    buf[8 - width..].copy_from_slice(&data[..width]);
    Ok(u64::from_be_bytes(buf))
}

/// Encode `length` as a fixed-width (1/2/4-byte) big-endian field.
pub fn encode_fixed(length: u64, width: u8) -> Result<Vec<u8>> {
    let max = match width {
        1 => u8::MAX as u64,
        2 => u16::MAX as u64,
        4 => u32::MAX as u64,
        _ => return Err(Error::MalformedLength("fixed length width must be 1, 2, or 4")),
    };
    if length > max {
        return Err(Error::LengthOverflow { value: length, width });
    }
    let full = length.to_be_bytes();
    Ok(full[8 - width as usize..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ber_short_form() {
        assert_eq!(decode_ber(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_ber(&[0x7F]).unwrap(), (127, 1));
    }

    #[test]
    fn ber_long_form() {
        assert_eq!(decode_ber(&[0x81, 0x80]).unwrap(), (128, 2));
        assert_eq!(decode_ber(&[0x82, 0xFF, 0xFF]).unwrap(), (65535, 3));
    }

    #[test]
    fn ber_malformed_n_zero() {
        assert!(decode_ber(&[0x80]).is_err());
    }

    #[test]
    fn ber_n_too_large() {
        assert!(decode_ber(&[0x89, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn ber_overflow_for_signed_target() {
        let err = decode_ber(&[0x88, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, Error::MalformedLength(_)));
    }

    #[test]
    fn ber_encode_matches_scenarios() {
        assert_eq!(encode_ber_min(127), vec![0x7F]);
        assert_eq!(encode_ber_min(128), vec![0x81, 0x80]);
        assert_eq!(encode_ber_min(65535), vec![0x82, 0xFF, 0xFF]);
        assert_eq!(encode_ber_min(0), vec![0x00]);
    }

    #[test]
    fn ber_round_trip() {
        for len in [0u64, 1, 127, 128, 255, 256, 65535, 65536, 1 << 32, MAX_LENGTH] {
            let enc = encode_ber_min(len);
            let (dec, consumed) = decode_ber(&enc).unwrap();
            assert_eq!(dec, len);
            assert_eq!(consumed, enc.len());
        }
    }

    #[test]
    fn ber_fixed_width_padding_round_trips() {
        let enc = encode_ber_fixed(5, 5).unwrap();
        assert_eq!(enc.len(), 5);
        let (dec, consumed) = decode_ber(&enc).unwrap();
        assert_eq!(dec, 5);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn fixed_width_round_trip() {
        assert_eq!(decode_fixed(&encode_fixed(65535, 2).unwrap(), 2).unwrap(), 65535);
        assert!(encode_fixed(65536, 2).is_err());
        assert!(encode_fixed(256, 1).is_err());
    }

    proptest! {
        #[test]
        fn ber_round_trip_prop(len in 0u64..MAX_LENGTH) {
            let enc = encode_ber_min(len);
            let (dec, consumed) = decode_ber(&enc).unwrap();
            prop_assert_eq!(dec, len);
            prop_assert_eq!(consumed, enc.len());
        }

        #[test]
        fn ber_fixed_width_at_least_min_round_trips(len in 0u64..1_000_000u64, extra in 0usize..4) {
            let min = min_ber_width(len);
            let width = min + extra;
            let enc = encode_ber_fixed(len, width).unwrap();
            let (dec, _) = decode_ber(&enc).unwrap();
            prop_assert_eq!(dec, len);
            prop_assert_eq!(enc.len(), width);
        }
    }
}
