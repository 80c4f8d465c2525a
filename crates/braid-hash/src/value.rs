//! Fixed-width unsigned hash values
//!
//! A `HashValue` is an immutable unsigned integer bounded by
//! `HashValue::MAX = 2^127 - 1`. Arithmetic is exact and re-reduced
//! modulo `2^127`, so results always land back in the usable range.
//! Values serialize to a fixed 16-byte big-endian buffer.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HashError;

/// Bit mask selecting the 127 usable bits of the hash space.
const RANGE_MASK: u128 = u128::MAX >> 1;

/// A value in the 127-bit partition hash space.
///
/// Invariant: the wrapped integer never exceeds [`HashValue::MAX`].
/// All constructors and operations re-establish the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashValue(u128);

impl HashValue {
    /// Smallest value in the hash space
    pub const ZERO: HashValue = HashValue(0);

    /// Largest value in the hash space (`2^127 - 1`)
    pub const MAX: HashValue = HashValue(RANGE_MASK);

    /// Reduce an arbitrary 128-bit value into the hash space.
    ///
    /// Masking the top bit is exact reduction modulo `2^127`.
    pub fn reduced(raw: u128) -> Self {
        Self(raw & RANGE_MASK)
    }

    /// Exact addition, reduced modulo `2^127`.
    ///
    /// Wrapping u128 addition computes the sum modulo `2^128`; masking
    /// then reduces modulo `2^127`, which equals exact reduction because
    /// `2^127` divides `2^128`.
    pub fn add(self, other: HashValue) -> HashValue {
        Self::reduced(self.0.wrapping_add(other.0))
    }

    /// Exact subtraction, reduced modulo `2^127`.
    pub fn sub(self, other: HashValue) -> HashValue {
        Self::reduced(self.0.wrapping_sub(other.0))
    }

    /// Exact multiplication, reduced modulo `2^127`.
    pub fn mul(self, other: HashValue) -> HashValue {
        Self::reduced(self.0.wrapping_mul(other.0))
    }

    /// Integer division. The quotient never exceeds the dividend, so no
    /// reduction is required.
    pub fn div(self, other: HashValue) -> Result<HashValue, HashError> {
        if other.0 == 0 {
            return Err(HashError::DivisionByZero);
        }
        Ok(Self(self.0 / other.0))
    }

    /// Encode as a fixed 16-byte big-endian buffer.
    pub fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Decode from a fixed 16-byte big-endian buffer.
    ///
    /// Fails if the decoded magnitude exceeds [`HashValue::MAX`], i.e. if
    /// the guard bit is set.
    pub fn from_bytes(bytes: [u8; 16]) -> Result<HashValue, HashError> {
        let raw = u128::from_be_bytes(bytes);
        if raw > RANGE_MASK {
            return Err(HashError::OutOfRange);
        }
        Ok(Self(raw))
    }

    /// The wrapped integer value.
    pub fn value(self) -> u128 {
        self.0
    }
}

impl From<u64> for HashValue {
    fn from(value: u64) -> Self {
        // A u64 always fits the 127-bit range.
        Self(value as u128)
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:032x}", self.0))
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        let raw = u128::from_str_radix(&hex, 16)
            .map_err(|e| D::Error::custom(HashError::InvalidEncoding(e.to_string())))?;
        if raw > RANGE_MASK {
            return Err(D::Error::custom(HashError::OutOfRange));
        }
        Ok(Self(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hv(value: u64) -> HashValue {
        HashValue::from(value)
    }

    #[test]
    fn test_round_trip_canonical_values() {
        for value in [
            HashValue::ZERO,
            hv(1),
            hv(u64::MAX),
            HashValue::reduced(1u128 << 100),
            HashValue::MAX,
        ] {
            let decoded = HashValue::from_bytes(value.to_bytes()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_from_bytes_rejects_guard_bit() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x80; // 2^127, one past MAX
        assert_eq!(HashValue::from_bytes(bytes), Err(HashError::OutOfRange));

        let all_set = [0xffu8; 16];
        assert_eq!(HashValue::from_bytes(all_set), Err(HashError::OutOfRange));
    }

    #[test]
    fn test_add_wraps_at_range_boundary() {
        assert_eq!(HashValue::MAX.add(hv(1)), HashValue::ZERO);
        assert_eq!(hv(3).add(hv(4)), hv(7));
    }

    #[test]
    fn test_sub_wraps_below_zero() {
        assert_eq!(hv(7).sub(hv(3)), hv(4));
        assert_eq!(HashValue::ZERO.sub(hv(1)), HashValue::MAX);
    }

    #[test]
    fn test_mul_reduces_into_range() {
        assert_eq!(hv(6).mul(hv(7)), hv(42));

        // (2^126) * 2 overflows the usable range and reduces to zero.
        let high = HashValue::reduced(1u128 << 126);
        assert_eq!(high.mul(hv(2)), HashValue::ZERO);
    }

    #[test]
    fn test_div_quotient_and_zero_divisor() {
        assert_eq!(hv(42).div(hv(6)).unwrap(), hv(7));
        assert_eq!(hv(7).div(hv(2)).unwrap(), hv(3));
        assert_eq!(hv(1).div(HashValue::ZERO), Err(HashError::DivisionByZero));
    }

    #[test]
    fn test_total_order() {
        assert!(HashValue::ZERO < hv(1));
        assert!(hv(1) < HashValue::MAX);
        assert_eq!(hv(5).cmp(&hv(5)), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_hex_serde_round_trip() {
        let value = HashValue::reduced(0x0123_4567_89ab_cdef_u128 << 32);
        let json = serde_json::to_string(&value).unwrap();
        let back: HashValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_hex_serde_rejects_out_of_range() {
        let json = format!("\"{:032x}\"", u128::MAX);
        assert!(serde_json::from_str::<HashValue>(&json).is_err());
    }
}
