//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Deal prices are money; they are parsed and stored canonically rather than
//! as floats to avoid drift through the store round-trip.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal for price fields.
///
/// Serializes to a JSON number (not a string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_trims_trailing_zeros() {
        let d = Decimal::from_str_canonical("19.90").unwrap();
        assert_eq!(d.to_canonical_string(), "19.9");
    }

    #[test]
    fn test_is_negative() {
        assert!(Decimal::from_str_canonical("-0.01").unwrap().is_negative());
        assert!(!Decimal::zero().is_negative());
        assert!(!Decimal::from_str_canonical("3.50").unwrap().is_negative());
    }

    #[test]
    fn test_serializes_as_json_number() {
        let d = Decimal::from_str_canonical("4.99").unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "4.99");
    }
}
