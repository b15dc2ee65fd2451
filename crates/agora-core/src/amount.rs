//! Ledger amount type with fixed-point precision.
//!
//! All balances, prices, and fees in Agora are `Amount`s: unsigned
//! integers counting micro-tokens (10^-6 AGO). Arithmetic is checked
//! everywhere; overflow is an error, never a wrap.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::CoreError;

/// Number of decimal places carried by an [`Amount`].
pub const DECIMALS: u32 = 6;

/// Micro-tokens per whole AGO.
pub const MICRO_PER_TOKEN: u64 = 1_000_000;

/// An unsigned token amount in micro-AGO (10^-6 AGO).
///
/// Stored as a `u64` in the smallest currency unit so that ledger
/// arithmetic never touches floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount from micro-AGO units.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates an amount from whole AGO. Saturates at `MAX` on overflow.
    #[must_use]
    pub const fn from_tokens(tokens: u64) -> Self {
        match tokens.checked_mul(MICRO_PER_TOKEN) {
            Some(v) => Self(v),
            None => Self::MAX,
        }
    }

    /// Returns the amount in micro-AGO units.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns the amount in whole AGO, truncating the fractional part.
    #[must_use]
    pub const fn as_tokens(self) -> u64 {
        self.0 / MICRO_PER_TOKEN
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a scalar. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, rhs: u64) -> Option<Self> {
        match self.0.checked_mul(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked division by a scalar. Returns `None` if the divisor is zero.
    #[must_use]
    pub const fn checked_div(self, rhs: u64) -> Option<Self> {
        match self.0.checked_div(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MICRO_PER_TOKEN;
        let frac = self.0 % MICRO_PER_TOKEN;
        write!(f, "{whole}.{frac:06} AGO")
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('-') {
            return Err(CoreError::InvalidAmount(
                "negative values not allowed".into(),
            ));
        }

        let mut parts = s.splitn(3, '.');
        let whole_str = parts.next().unwrap_or_default();
        let frac_str = parts.next();
        if parts.next().is_some() {
            return Err(CoreError::InvalidAmount(format!("invalid format: {s}")));
        }

        let whole: u64 = if whole_str.is_empty() && frac_str.is_some() {
            0
        } else {
            whole_str
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid number: {s}")))?
        };

        let whole_micros = whole
            .checked_mul(MICRO_PER_TOKEN)
            .ok_or_else(|| CoreError::InvalidAmount("overflow".into()))?;

        let frac = match frac_str {
            None => 0,
            Some(frac_str) => {
                if frac_str.len() > DECIMALS as usize {
                    return Err(CoreError::InvalidAmount("too many decimal places".into()));
                }
                let padded = format!("{frac_str:0<6}");
                padded
                    .parse::<u64>()
                    .map_err(|_| CoreError::InvalidAmount(format!("invalid fraction: {s}")))?
            }
        };

        whole_micros
            .checked_add(frac)
            .map(Amount)
            .ok_or_else(|| CoreError::InvalidAmount("overflow".into()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Decimal string without trailing zeros.
        let whole = self.0 / MICRO_PER_TOKEN;
        let frac = self.0 % MICRO_PER_TOKEN;

        let s = if frac == 0 {
            format!("{whole}")
        } else {
            let frac_str = format!("{frac:06}");
            let trimmed = frac_str.trim_end_matches('0');
            format!("{whole}.{trimmed}")
        };

        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_micros_preserves_value() {
        let amount = Amount::from_micros(999_000_000);
        assert_eq!(amount.as_micros(), 999_000_000);
    }

    #[test]
    fn from_tokens_scales_by_decimals() {
        let amount = Amount::from_tokens(42);
        assert_eq!(amount.as_micros(), 42_000_000);
        assert_eq!(amount.as_tokens(), 42);
    }

    #[test]
    fn as_tokens_truncates_fraction() {
        let amount = Amount::from_micros(2_500_000);
        assert_eq!(amount.as_tokens(), 2);
    }

    #[test]
    fn checked_add_detects_overflow() {
        let a = Amount::from_tokens(3);
        let b = Amount::from_tokens(4);
        assert_eq!(a.checked_add(b), Some(Amount::from_tokens(7)));
        assert_eq!(Amount::MAX.checked_add(Amount::from_micros(1)), None);
    }

    #[test]
    fn checked_sub_detects_underflow() {
        let a = Amount::from_tokens(10);
        let b = Amount::from_tokens(3);
        assert_eq!(a.checked_sub(b), Some(Amount::from_tokens(7)));
        assert_eq!(b.checked_sub(a), None);
    }

    #[test]
    fn checked_mul_and_div() {
        let a = Amount::from_tokens(5);
        assert_eq!(a.checked_mul(3), Some(Amount::from_tokens(15)));
        assert_eq!(Amount::MAX.checked_mul(2), None);
        assert_eq!(a.checked_div(5), Some(Amount::from_tokens(1)));
        assert_eq!(a.checked_div(0), None);
    }

    #[test]
    fn display_shows_six_decimals() {
        let amount = Amount::from_micros(1_500_000);
        assert_eq!(format!("{amount}"), "1.500000 AGO");
        assert_eq!(format!("{}", Amount::ZERO), "0.000000 AGO");
    }

    #[test]
    fn from_str_parses_decimal_forms() {
        let a: Amount = "1.5".parse().unwrap();
        assert_eq!(a.as_micros(), 1_500_000);

        let b: Amount = "42".parse().unwrap();
        assert_eq!(b.as_micros(), 42_000_000);

        let c: Amount = "0.000001".parse().unwrap();
        assert_eq!(c.as_micros(), 1);
    }

    #[test]
    fn from_str_rejects_bad_input() {
        assert!("abc".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1.2345678".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let original = Amount::from_micros(24_975_000);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#""24.975""#);
        let restored: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    proptest! {
        #[test]
        fn from_str_roundtrips_any_micros(micros in any::<u64>()) {
            let amount = Amount::from_micros(micros);
            let json = serde_json::to_string(&amount).unwrap();
            let restored: Amount = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(amount, restored);
        }

        #[test]
        fn checked_add_matches_u64(a in any::<u64>(), b in any::<u64>()) {
            let sum = Amount::from_micros(a).checked_add(Amount::from_micros(b));
            prop_assert_eq!(sum.map(Amount::as_micros), a.checked_add(b));
        }
    }
}
