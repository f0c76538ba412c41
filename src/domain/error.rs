//! Calculation errors.
//!
//! Every failure the engine can produce is a caller input error, never a
//! transient fault. Messages are stable and surfaced verbatim to the
//! request originator.

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejection reasons produced by validation, scaling, and calculation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    /// `amount_to_sell`, `buy_price` or `current_price` is not strictly positive.
    #[error("invalid {field}: must be greater than zero, got {value}")]
    InvalidAmount { field: &'static str, value: Decimal },

    /// Take-profit does not sit above the entry price.
    #[error(
        "invalid take_profit_price: {take_profit} must be greater than buy_price {buy_price}"
    )]
    InvalidTakeProfit {
        take_profit: Decimal,
        buy_price: Decimal,
    },

    /// Stop-loss is not strictly between zero and the entry price.
    #[error(
        "invalid stop_loss_price: {stop_loss} must be greater than zero and less than buy_price {buy_price}"
    )]
    InvalidStopLoss {
        stop_loss: Decimal,
        buy_price: Decimal,
    },

    /// Take-profit does not sit above stop-loss.
    #[error(
        "inconsistent targets: take_profit_price {take_profit} must be greater than stop_loss_price {stop_loss}"
    )]
    InconsistentTargets {
        take_profit: Decimal,
        stop_loss: Decimal,
    },

    #[error("unsupported {field}: {decimals} exceeds the maximum of {max}")]
    UnsupportedDecimals {
        field: &'static str,
        decimals: u32,
        max: u32,
    },

    /// The scaled integer would not fit in 128 bits.
    #[error("scaled amount overflow: {value} at {decimals} decimals")]
    ScaledOverflow { value: Decimal, decimals: u32 },

    #[error("invalid scaled amount {text:?}: expected an unsigned integer")]
    InvalidScaledAmount { text: String },

    #[error("arithmetic overflow computing {operation}")]
    ArithmeticOverflow { operation: &'static str },
}

impl CalculationError {
    /// Name of the request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidAmount { field, .. } | Self::UnsupportedDecimals { field, .. } => *field,
            Self::InvalidTakeProfit { .. } | Self::InconsistentTargets { .. } => "take_profit_price",
            Self::InvalidStopLoss { .. } => "stop_loss_price",
            Self::ScaledOverflow { .. } | Self::InvalidScaledAmount { .. } => "scaled_amount",
            Self::ArithmeticOverflow { operation } => *operation,
        }
    }

    /// Short machine-readable code for the wire.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidTakeProfit { .. } => "INVALID_TAKE_PROFIT",
            Self::InvalidStopLoss { .. } => "INVALID_STOP_LOSS",
            Self::InconsistentTargets { .. } => "INCONSISTENT_TARGETS",
            Self::UnsupportedDecimals { .. } => "UNSUPPORTED_DECIMALS",
            Self::ScaledOverflow { .. }
            | Self::InvalidScaledAmount { .. }
            | Self::ArithmeticOverflow { .. } => "ARITHMETIC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_message_names_field() {
        let err = CalculationError::InvalidAmount {
            field: "amount_to_sell",
            value: dec!(0),
        };
        assert_eq!(
            err.to_string(),
            "invalid amount_to_sell: must be greater than zero, got 0"
        );
        assert_eq!(err.field(), "amount_to_sell");
        assert_eq!(err.code(), "INVALID_AMOUNT");
    }

    #[test]
    fn test_stop_loss_error_code() {
        let err = CalculationError::InvalidStopLoss {
            stop_loss: dec!(96),
            buy_price: dec!(95),
        };
        assert_eq!(err.code(), "INVALID_STOP_LOSS");
        assert_eq!(err.field(), "stop_loss_price");
        assert!(err.to_string().contains("less than buy_price 95"));
    }
}
