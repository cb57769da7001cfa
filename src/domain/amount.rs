//! Fixed scale-4 monetary amount backed by rust_decimal.
//!
//! Every share quantity and monetary value in the ledger is an `Amount`.
//! Results of arithmetic are re-quantized to four fractional digits with
//! round-half-away-from-zero.

use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by every `Amount`.
pub const SCALE: u32 = 4;

/// Locale controlling the integer/fraction separator of textual amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// Swedish formatting: `1 234,5678`.
    Se,
    /// US formatting: `1234.5678`.
    Us,
}

impl Locale {
    fn separator(self) -> char {
        match self {
            Locale::Se => ',',
            Locale::Us => '.',
        }
    }
}

impl FromStr for Locale {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SE" => Ok(Locale::Se),
            "US" => Ok(Locale::Us),
            other => Err(AmountError::InvalidLocale(other.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Se => write!(f, "SE"),
            Locale::Us => write!(f, "US"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("value is invalid for precision value: {0:?}")]
    InvalidValue(String),
    #[error("invalid locale: {0}")]
    InvalidLocale(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("amount overflow")]
    Overflow,
}

/// Scale-4 fixed point amount.
///
/// Deserialized values are quantized like any other input.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RustDecimal")]
pub struct Amount(RustDecimal);

impl Amount {
    /// Quantize an arbitrary decimal to scale 4.
    pub fn new(value: RustDecimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(SCALE);
        Amount(rounded)
    }

    /// Build an amount from its scale-4 mantissa, e.g. `from_mantissa(12345)` is `1.2345`.
    pub fn from_mantissa(mantissa: i64) -> Self {
        Amount(RustDecimal::new(mantissa, SCALE))
    }

    /// Whole-unit amount, mostly useful in tests and constants.
    pub fn from_units(units: i64) -> Self {
        Amount::new(RustDecimal::from(units))
    }

    /// Scale-4 mantissa as stored in the ledger database.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` if the mantissa does not fit in an `i64`.
    pub fn mantissa(&self) -> Result<i64, AmountError> {
        i64::try_from(self.0.mantissa()).map_err(|_| AmountError::Overflow)
    }

    /// Parse a locale-formatted string.
    ///
    /// Whitespace (including non-breaking spaces used as digit grouping) is
    /// ignored. The fractional part is right-padded or truncated to exactly
    /// four digits. Blank input is an error; callers decide whether a blank
    /// field means zero.
    ///
    /// # Errors
    /// Returns `AmountError::InvalidValue` for malformed literals.
    pub fn parse(text: &str, locale: Locale) -> Result<Self, AmountError> {
        let invalid = || AmountError::InvalidValue(text.to_string());
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(invalid());
        }

        let (integer, fraction) = match compact.split_once(locale.separator()) {
            Some((integer, fraction)) => (integer, fraction),
            None => (compact.as_str(), ""),
        };

        let (negative, digits) = match integer.as_bytes().first() {
            Some(b'-') => (true, &integer[1..]),
            Some(b'+') => (false, &integer[1..]),
            _ => (false, integer),
        };

        if digits.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let mut mantissa_digits = String::with_capacity(digits.len() + SCALE as usize);
        mantissa_digits.push_str(if digits.is_empty() { "0" } else { digits });
        mantissa_digits.extend(fraction.chars().chain(std::iter::repeat('0')).take(SCALE as usize));

        let magnitude = mantissa_digits.parse::<i128>().map_err(|_| invalid())?;
        let mantissa = if negative { -magnitude } else { magnitude };
        RustDecimal::try_from_i128_with_scale(mantissa, SCALE)
            .map(Amount)
            .map_err(|_| AmountError::Overflow)
    }

    /// Format with exactly four fractional digits using the locale separator.
    pub fn format(&self, locale: Locale) -> String {
        let text = self.to_string();
        match locale {
            Locale::Us => text,
            Locale::Se => text.replace('.', ","),
        }
    }

    pub fn zero() -> Self {
        Amount::from_mantissa(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Amount(self.0.abs())
    }

    /// Checked sum.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the result is out of range.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount::new)
            .ok_or(AmountError::Overflow)
    }

    /// Checked difference.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the result is out of range.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount::new)
            .ok_or(AmountError::Overflow)
    }

    /// Checked product, re-quantized to scale 4.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the result is out of range.
    pub fn checked_mul(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_mul(rhs.0)
            .map(Amount::new)
            .ok_or(AmountError::Overflow)
    }

    /// Checked quotient, re-quantized to scale 4.
    ///
    /// # Errors
    /// Returns `AmountError::DivisionByZero` when `rhs` is zero.
    pub fn checked_div(self, rhs: Amount) -> Result<Amount, AmountError> {
        if rhs.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Amount::new)
            .ok_or(AmountError::Overflow)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a US-formatted amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s, Locale::Us)
    }
}

impl From<RustDecimal> for Amount {
    fn from(value: RustDecimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for RustDecimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount::new(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount::new(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul for Amount {
    type Output = Amount;

    fn mul(self, rhs: Amount) -> Amount {
        Amount::new(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, value| acc + value)
    }
}

/// Compare two amounts numerically.
pub fn compare(a: &Amount, b: &Amount) -> Ordering {
    a.cmp(b)
}
