//! Fixed-point decimal with 18 fractional digits.
//!
//! `Dec` stores `value * 10^18` in a `BigUint`, so it never overflows and
//! never loses integer precision. Multiplication truncates toward zero,
//! which is the only rounding rule used by the minting path.

use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by [`Dec`].
pub const DEC_PRECISION: u32 = 18;

static PRECISION_MULTIPLIER: Lazy<BigUint> = Lazy::new(|| BigUint::from(10u32).pow(DEC_PRECISION));

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecError {
    #[error("decimal must not be negative: {0}")]
    Negative(String),
    #[error("malformed decimal: {0:?}")]
    Malformed(String),
    #[error("decimal {0:?} has more than 18 fractional digits")]
    TooPrecise(String),
}

#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dec(BigUint);

impl Dec {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(PRECISION_MULTIPLIER.clone())
    }

    /// Whole-unit value.
    pub fn from_int(value: impl Into<BigUint>) -> Self {
        Self(value.into() * &*PRECISION_MULTIPLIER)
    }

    /// Interpret `raw` as already scaled by `10^18`.
    pub fn from_atomics(raw: BigUint) -> Self {
        Self(raw)
    }

    pub fn atomics(&self) -> &BigUint {
        &self.0
    }

    /// Convert a governance-supplied `Decimal`. Digits beyond the 18th
    /// fractional place are truncated.
    pub fn from_decimal(value: &Decimal) -> Result<Self, DecError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DecError::Negative(value.to_string()));
        }
        let mantissa = BigUint::from(value.mantissa().unsigned_abs());
        let scale = value.scale();
        let raw = if scale <= DEC_PRECISION {
            mantissa * BigUint::from(10u32).pow(DEC_PRECISION - scale)
        } else {
            mantissa / BigUint::from(10u32).pow(scale - DEC_PRECISION)
        };
        Ok(Self(raw))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: &Dec) -> Dec {
        Dec(&self.0 + &other.0)
    }

    /// `self * other`, truncating everything past the 18th fractional digit.
    pub fn mul_truncate(&self, other: &Dec) -> Dec {
        Dec((&self.0 * &other.0) / &*PRECISION_MULTIPLIER)
    }

    /// Integer part.
    pub fn floor(&self) -> BigUint {
        &self.0 / &*PRECISION_MULTIPLIER
    }

    /// Fractional part, always in `[0, 1)`.
    pub fn fract(&self) -> Dec {
        Dec(&self.0 % &*PRECISION_MULTIPLIER)
    }

    pub fn is_below_one(&self) -> bool {
        self.0 < *PRECISION_MULTIPLIER
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.floor();
        let frac = &self.0 % &*PRECISION_MULTIPLIER;
        write!(
            f,
            "{}.{:0>width$}",
            int,
            frac.to_str_radix(10),
            width = DEC_PRECISION as usize
        )
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = DecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(DecError::Negative(s.to_string()));
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits_only = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if int_part.is_empty() || !digits_only(int_part) || !digits_only(frac_part) {
            return Err(DecError::Malformed(s.to_string()));
        }
        if frac_part.len() > DEC_PRECISION as usize {
            return Err(DecError::TooPrecise(s.to_string()));
        }

        let mut scaled = String::with_capacity(int_part.len() + DEC_PRECISION as usize);
        scaled.push_str(int_part);
        scaled.push_str(frac_part);
        for _ in frac_part.len()..DEC_PRECISION as usize {
            scaled.push('0');
        }
        let raw = scaled
            .parse::<BigUint>()
            .map_err(|_| DecError::Malformed(s.to_string()))?;
        Ok(Self(raw))
    }
}

impl TryFrom<String> for Dec {
    type Error = DecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dec> for String {
    fn from(value: Dec) -> Self {
        value.to_string()
    }
}
