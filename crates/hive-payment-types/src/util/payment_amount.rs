//! Human-readable payment amounts.
//!
//! Payments are requested in whole ELA (for example `"2.5"`) but the contract is
//! paid in wei, the native token's smallest unit with 18 decimal places. The
//! conversion happens on a [`Decimal`] mantissa so that no floating-point rounding
//! can creep in.
//!
//! ```rust
//! use alloy_primitives::U256;
//! use hive_payment_types::util::PaymentAmount;
//!
//! let amount = PaymentAmount::parse("2.5").unwrap();
//! assert_eq!(amount.to_wei().unwrap(), U256::from(2_500_000_000_000_000_000u128));
//! ```

use alloy_primitives::U256;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Decimal places of the native token.
pub const NATIVE_DECIMALS: u32 = 18;

/// A plain decimal number, optionally followed by the `ELA` unit.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?(?:\d+(?:\.\d*)?|\.\d+))\s*(?i:ELA)?\s*$")
        .expect("valid amount pattern")
});

/// A non-negative decimal amount as typed by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentAmount(Decimal);

/// Errors that can occur when parsing or converting a payment amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaymentAmountParseError {
    #[error("Invalid number format")]
    InvalidFormat,
    #[error("Negative value is not allowed")]
    Negative,
    /// More decimal places than the target unit can represent.
    #[error("Too big of a precision: {amount} decimal places vs {unit} on the unit")]
    WrongPrecision { amount: u32, unit: u32 },
}

impl PaymentAmount {
    /// Parses a decimal string such as `"2.5"`, `"1000"` or `"0.25 ELA"`.
    ///
    /// Exponents, grouping separators, hex and any other characters are rejected.
    pub fn parse(input: &str) -> Result<Self, PaymentAmountParseError> {
        let number = AMOUNT
            .captures(input)
            .and_then(|captures| captures.get(1))
            .ok_or(PaymentAmountParseError::InvalidFormat)?;
        let parsed = Decimal::from_str(number.as_str())
            .map_err(|_| PaymentAmountParseError::InvalidFormat)?;
        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(PaymentAmountParseError::Negative);
        }
        Ok(PaymentAmount(parsed))
    }

    /// Number of decimal places in the input.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// The digits of the input without the decimal point (`"12.34"` gives `1234`).
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    /// Converts to integer base units of a token with `decimals` decimal places.
    pub fn to_base_units(&self, decimals: u32) -> Result<U256, PaymentAmountParseError> {
        let scale = self.scale();
        if scale > decimals {
            return Err(PaymentAmountParseError::WrongPrecision {
                amount: scale,
                unit: decimals,
            });
        }
        let multiplier = U256::from(10).pow(U256::from(decimals - scale));
        Ok(U256::from(self.mantissa()) * multiplier)
    }

    /// Converts to wei.
    pub fn to_wei(&self) -> Result<U256, PaymentAmountParseError> {
        self.to_base_units(NATIVE_DECIMALS)
    }
}

impl FromStr for PaymentAmount {
    type Err = PaymentAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentAmount::parse(s)
    }
}

impl fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
