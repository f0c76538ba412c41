//! Fixed-point amount scaling.
//!
//! On-chain amounts are unsigned integers in the token's smallest unit.
//! Conversion to that representation truncates: fractional sub-units are
//! dropped, never rounded up, so an order never requests more of a token
//! than the caller intended.
//!
//! All arithmetic here is on the decimal's integer mantissa, never on
//! floats and never on a `Decimal` multiplied by `10^decimals` (which can
//! exceed the 96-bit mantissa well before `u128` does).

use rust_decimal::Decimal;

use super::error::CalculationError;

/// Largest token precision accepted anywhere in the engine.
pub const MAX_DECIMALS: u32 = 18;

/// Convert a human-scale amount to its fixed-point integer at `decimals`.
///
/// `scaled = floor(amount × 10^decimals)`.
///
/// # Errors
/// Rejects negative amounts, precisions above [`MAX_DECIMALS`], and results
/// that do not fit in a `u128`.
pub fn to_scaled_amount(amount: Decimal, decimals: u32) -> Result<u128, CalculationError> {
    check_decimals("decimals", decimals)?;
    if amount < Decimal::ZERO {
        return Err(CalculationError::InvalidAmount {
            field: "amount",
            value: amount,
        });
    }

    let overflow = || CalculationError::ScaledOverflow {
        value: amount,
        decimals,
    };

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| overflow())?;
    let scale = amount.scale();

    if scale <= decimals {
        10u128
            .checked_pow(decimals - scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or_else(overflow)
    } else {
        // Integer division on a non-negative mantissa truncates toward zero.
        let divisor = 10u128.checked_pow(scale - decimals).ok_or_else(overflow)?;
        Ok(mantissa / divisor)
    }
}

/// Convert exact integer text back to a human-scale decimal.
///
/// `amount = integer(scaled_text) / 10^decimals`. The result is for display
/// and aggregation only.
///
/// # Errors
/// Rejects text that is not a plain unsigned integer, values wider than the
/// decimal mantissa, and precisions above [`MAX_DECIMALS`].
pub fn from_scaled_amount(scaled_text: &str, decimals: u32) -> Result<Decimal, CalculationError> {
    let trimmed = scaled_text.trim();
    let invalid = || CalculationError::InvalidScaledAmount {
        text: scaled_text.to_string(),
    };

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u128 = trimmed.parse().map_err(|_| invalid())?;
    from_scaled_units(value, decimals).map_err(|err| match err {
        CalculationError::UnsupportedDecimals { .. } => err,
        _ => invalid(),
    })
}

/// Integer form of [`from_scaled_amount`], used on values already held as `u128`.
///
/// # Errors
/// See [`from_scaled_amount`].
pub fn from_scaled_units(value: u128, decimals: u32) -> Result<Decimal, CalculationError> {
    check_decimals("decimals", decimals)?;
    let invalid = || CalculationError::InvalidScaledAmount {
        text: value.to_string(),
    };
    let signed = i128::try_from(value).map_err(|_| invalid())?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|_| invalid())
}

pub(crate) fn check_decimals(
    field: &'static str,
    decimals: u32,
) -> Result<(), CalculationError> {
    if decimals > MAX_DECIMALS {
        return Err(CalculationError::UnsupportedDecimals {
            field,
            decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}

/// Serde helper: `u128` as exact integer text.
///
/// JSON consumers that parse numbers as IEEE doubles lose precision past
/// 2^53, which on-chain amounts routinely exceed.
pub mod amount_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim().parse().map_err(serde::de::Error::custom)
    }
}
