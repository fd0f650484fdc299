// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! 32-bit value codec for Modbus register pairs
//!
//! Modbus cells are 16 bits wide, so 32-bit values span two consecutive
//! registers. The simulator uses big-endian word order: the most significant
//! word sits at the lower address.
//!
//! ```
//! use rust_chiller_sim::codec::{decode_float32, encode_float32};
//!
//! let (hi, lo) = encode_float32(25.5);
//! assert_eq!((hi, lo), (0x41CC, 0x0000));
//! assert_eq!(decode_float32(hi, lo), 25.5);
//! ```

/// Split an IEEE-754 single precision value into `(high word, low word)`.
pub fn encode_float32(value: f32) -> (u16, u16) {
    encode_uint32(value.to_bits())
}

/// Split an unsigned 32-bit value into `(high word, low word)`.
pub fn encode_uint32(value: u32) -> (u16, u16) {
    (((value >> 16) & 0xFFFF) as u16, (value & 0xFFFF) as u16)
}

/// Rebuild a float from its two words. Bit exact, NaN payloads included.
pub fn decode_float32(hi: u16, lo: u16) -> f32 {
    f32::from_bits(decode_uint32(hi, lo))
}

/// Rebuild an unsigned 32-bit value from its two words.
pub fn decode_uint32(hi: u16, lo: u16) -> u32 {
    ((hi as u32) << 16) | lo as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_float32_matches_big_endian_bytes() {
        assert_eq!(encode_float32(25.5), (0x41CC, 0x0000));

        let bytes = (-28.88f32).to_be_bytes();
        let (hi, lo) = encode_float32(-28.88);
        assert_eq!(hi, u16::from_be_bytes([bytes[0], bytes[1]]));
        assert_eq!(lo, u16::from_be_bytes([bytes[2], bytes[3]]));
    }

    #[test]
    fn test_encode_uint32_splits_words() {
        assert_eq!(encode_uint32(0), (0, 0));
        assert_eq!(encode_uint32(100), (0, 100));
        assert_eq!(encode_uint32(0x0001_0000), (1, 0));
        assert_eq!(encode_uint32(0xDEAD_BEEF), (0xDEAD, 0xBEEF));
        assert_eq!(encode_uint32(u32::MAX), (0xFFFF, 0xFFFF));
    }

    #[test]
    fn test_float32_round_trip() {
        let values = [
            0.0f32,
            -0.0,
            1.0,
            -28.88,
            26.0,
            153.0,
            2000.0,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            1.0e-42, // subnormal
        ];
        for value in values {
            let (hi, lo) = encode_float32(value);
            assert_eq!(decode_float32(hi, lo).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_float32_nan_payload_is_preserved() {
        let nan = f32::from_bits(0x7FC0_1234);
        let (hi, lo) = encode_float32(nan);
        assert_eq!((hi, lo), (0x7FC0, 0x1234));
        assert_eq!(decode_float32(hi, lo).to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn test_uint32_round_trip_over_strided_range() {
        let mut value: u32 = 0;
        loop {
            let (hi, lo) = encode_uint32(value);
            assert_eq!(decode_uint32(hi, lo), value);
            match value.checked_add(65_521) {
                Some(next) => value = next,
                None => break,
            }
        }
        let (hi, lo) = encode_uint32(u32::MAX);
        assert_eq!(decode_uint32(hi, lo), u32::MAX);
    }
}
