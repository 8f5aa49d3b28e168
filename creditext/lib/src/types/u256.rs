use std::{fmt, str::FromStr};

use codec::{Decode, Encode};

/// 256-bit unsigned integer, laid out as four little-endian `u64` limbs,
/// matching the runtime's `ExternalAmount`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, scale_encode::EncodeAsType,
)]
pub struct U256(pub [u64; 4]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseU256Error {
    #[error("empty string")]
    Empty,
    #[error("invalid digit found in {0:?}")]
    InvalidDigit(String),
    #[error("number too large to fit in 256 bits")]
    Overflow,
}

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// `self * rhs + carry`, `None` on overflow.
    fn checked_mul_add(self, rhs: u64, carry: u64) -> Option<Self> {
        let mut out = [0u64; 4];
        let mut carry = carry as u128;
        for (limb, out) in self.0.iter().zip(out.iter_mut()) {
            let wide = (*limb as u128) * (rhs as u128) + carry;
            *out = wide as u64;
            carry = wide >> 64;
        }
        (carry == 0).then_some(U256(out))
    }

    /// Divides in place, returning the remainder.
    fn div_rem_small(&mut self, divisor: u64) -> u64 {
        let mut rem: u128 = 0;
        for limb in self.0.iter_mut().rev() {
            let acc = (rem << 64) | (*limb as u128);
            *limb = (acc / divisor as u128) as u64;
            rem = acc % divisor as u128;
        }
        rem as u64
    }

    fn from_str_radix(src: &str, radix: u32) -> Result<Self, ParseU256Error> {
        if src.is_empty() {
            return Err(ParseU256Error::Empty);
        }
        let mut value = U256::ZERO;
        for c in src.chars().filter(|c| *c != '_') {
            let digit = c
                .to_digit(radix)
                .ok_or_else(|| ParseU256Error::InvalidDigit(src.to_string()))?;
            value = value
                .checked_mul_add(radix as u64, digit as u64)
                .ok_or(ParseU256Error::Overflow)?;
        }
        Ok(value)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }
}

impl TryFrom<U256> for u128 {
    type Error = ParseU256Error;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        let [lo, hi, a, b] = value.0;
        if a != 0 || b != 0 {
            return Err(ParseU256Error::Overflow);
        }
        Ok(((hi as u128) << 64) | lo as u128)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
impl FromStr for U256 {
    type Err = ParseU256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(s, 10),
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut digits = Vec::new();
        let mut value = *self;
        while !value.is_zero() {
            digits.push(b'0' + value.div_rem_small(10) as u8);
        }
        digits.reverse();
        // Only ASCII digits were pushed
        f.write_str(&String::from_utf8_lossy(&digits))
    }
}

impl serde::Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for U256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct U256Visitor;

        impl<'de> serde::de::Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal/hex string")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<U256, E> {
                Ok(U256::from(v))
            }

            fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<U256, E> {
                Ok(U256::from(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<U256, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(U256Visitor)
    }
}
