//! Resource quantities in the notation used by kubernetes objects: `100m`, `1.5`, `2Gi`, `4e9`.
//!
//! A quantity is kept as saturating unsigned milli-units together with the format it was written
//! in, so that sums of memory requests keep rendering with binary suffixes and sums of cpu
//! requests keep rendering in millicores.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityFormat {
    /// Powers of ten: `m`, `k`, `M`, `G`, `T`, `P`, `E` and plain numbers.
    #[default]
    DecimalSI,
    /// Powers of two: `Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`.
    BinarySI,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,
    #[error("quantity {0:?} is negative")]
    Negative(String),
    #[error("quantity {0:?} has no valid numeric part")]
    InvalidNumber(String),
    #[error("quantity {0:?} has unknown suffix {1:?}")]
    UnknownSuffix(String, String),
}

// Suffix and the power of the format base it stands for.
const DECIMAL_SUFFIXES: [(&str, u32); 6] =
    [("k", 1), ("M", 2), ("G", 3), ("T", 4), ("P", 5), ("E", 6)];
const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 1),
    ("Mi", 2),
    ("Gi", 3),
    ("Ti", 4),
    ("Pi", 5),
    ("Ei", 6),
];

/// Quantities compare by amount, the format only affects rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quantity {
    milli: u64,
    format: QuantityFormat,
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.milli == other.milli
    }
}

impl Eq for Quantity {}

impl Quantity {
    pub fn from_milli(milli: u64, format: QuantityFormat) -> Self {
        Self { milli, format }
    }

    pub fn from_units(value: u64, format: QuantityFormat) -> Self {
        Self {
            milli: value.saturating_mul(1000),
            format,
        }
    }

    pub fn zero(format: QuantityFormat) -> Self {
        Self { milli: 0, format }
    }

    pub fn milli_value(&self) -> u64 {
        self.milli
    }

    /// Whole units, fractional values are rounded up.
    pub fn value(&self) -> u64 {
        self.milli.div_ceil(1000)
    }

    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.milli == 0
    }

    /// Saturating addition, the receiver keeps its format.
    pub fn add(&mut self, other: &Quantity) {
        self.milli = self.milli.saturating_add(other.milli);
    }

    /// Saturating subtraction, never goes below zero.
    pub fn sub(&mut self, other: &Quantity) {
        self.milli = self.milli.saturating_sub(other.milli);
    }
}

fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    numerator / denominator + u128::from(numerator % denominator != 0)
}

fn pow10(exponent: u32) -> u128 {
    10u128.checked_pow(exponent).unwrap_or(u128::MAX)
}

/// Applies `10^shift` to `value` where a negative shift divides and rounds up.
fn shift_decimal(value: u128, shift: i64) -> u128 {
    if shift >= 0 {
        value.saturating_mul(pow10(shift as u32))
    } else {
        ceil_div(value, pow10(shift.unsigned_abs() as u32))
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        if s.starts_with('-') {
            return Err(QuantityError::Negative(raw.to_string()));
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        let number_end = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_end);

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(QuantityError::InvalidNumber(raw.to_string()));
        }

        let mut digits: u128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = u128::from(c as u8 - b'0');
            digits = digits.saturating_mul(10).saturating_add(digit);
        }
        let frac_len = frac_part.len() as i64;

        let unknown_suffix = || QuantityError::UnknownSuffix(raw.to_string(), suffix.to_string());

        let (milli, format) = match suffix {
            "" => (shift_decimal(digits, 3 - frac_len), QuantityFormat::DecimalSI),
            "m" => (shift_decimal(digits, -frac_len), QuantityFormat::DecimalSI),
            _ => {
                if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(name, _)| *name == suffix) {
                    let unit = 1024u128.pow(*power) * 1000;
                    (
                        shift_decimal(digits.saturating_mul(unit), -frac_len),
                        QuantityFormat::BinarySI,
                    )
                } else if let Some((_, power)) =
                    DECIMAL_SUFFIXES.iter().find(|(name, _)| *name == suffix)
                {
                    let shift = 3 * i64::from(*power) + 3 - frac_len;
                    (shift_decimal(digits, shift), QuantityFormat::DecimalSI)
                } else if let Some(exponent) = suffix
                    .strip_prefix('e')
                    .or_else(|| suffix.strip_prefix('E'))
                {
                    let exponent: i64 = exponent.parse().map_err(|_| unknown_suffix())?;
                    let shift = exponent.clamp(-64, 64) + 3 - frac_len;
                    (shift_decimal(digits, shift), QuantityFormat::DecimalSI)
                } else {
                    return Err(unknown_suffix());
                }
            }
        };

        Ok(Quantity {
            milli: u64::try_from(milli).unwrap_or(u64::MAX),
            format,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milli % 1000 != 0 {
            return write!(f, "{}m", self.milli);
        }
        let value = self.milli / 1000;
        if value == 0 {
            return write!(f, "0");
        }
        let (base, suffixes): (u64, &[(&str, u32)]) = match self.format {
            QuantityFormat::DecimalSI => (1000, &DECIMAL_SUFFIXES),
            QuantityFormat::BinarySI => (1024, &BINARY_SUFFIXES),
        };
        for (suffix, power) in suffixes.iter().rev() {
            let unit = base.pow(*power);
            if value % unit == 0 {
                return write!(f, "{}{}", value / unit, suffix);
            }
        }
        write!(f, "{}", value)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a resource quantity such as 100m, 2Gi or 3")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        Ok(Quantity::from_units(v, QuantityFormat::DecimalSI))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        u64::try_from(v)
            .map(|v| Quantity::from_units(v, QuantityFormat::DecimalSI))
            .map_err(|_| E::custom(QuantityError::Negative(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}
