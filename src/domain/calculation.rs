//! Order calculation engine.
//!
//! Turns a trade intent into a BUY entry leg plus optional TAKE_PROFIT and
//! STOP_LOSS exit legs, each carrying fixed-point making/taking amounts.
//!
//! Direction rule: the entry leg sells the input token for the output
//! token. Exit legs sell what the entry leg is expected to acquire
//! (`amount_to_sell × buy_price`) back into the input token, so their
//! making side is scaled at `output_decimals` and their taking side at
//! `input_decimals`.
//!
//! The engine is a pure function of its request: no I/O, no clock, no
//! randomness. Identical requests yield identical results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CalculationError;
use super::scaling::{self, MAX_DECIMALS, amount_text};

/// Largest scaled amount a leg may carry: the 96-bit decimal mantissa.
pub const MAX_LEG_AMOUNT: u128 = (1 << 96) - 1;

/// Default precision of the entry input token.
pub const DEFAULT_INPUT_DECIMALS: u32 = 9;

/// Default precision of the entry output token.
pub const DEFAULT_OUTPUT_DECIMALS: u32 = 6;

const fn default_input_decimals() -> u32 {
    DEFAULT_INPUT_DECIMALS
}

const fn default_output_decimals() -> u32 {
    DEFAULT_OUTPUT_DECIMALS
}

/// A single trade intent, validated and computed once then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    /// Market reference price. Validated, never used in amount math.
    pub current_price: Decimal,
    /// Entry rate: output per input.
    pub buy_price: Decimal,
    #[serde(default)]
    pub take_profit_price: Option<Decimal>,
    #[serde(default)]
    pub stop_loss_price: Option<Decimal>,
    /// Quantity of the entry input token offered.
    pub amount_to_sell: Decimal,
    #[serde(default = "default_input_decimals")]
    pub input_decimals: u32,
    #[serde(default = "default_output_decimals")]
    pub output_decimals: u32,
}

impl CalculationRequest {
    /// Entry-only request with default token precisions.
    pub const fn new(current_price: Decimal, buy_price: Decimal, amount_to_sell: Decimal) -> Self {
        Self {
            current_price,
            buy_price,
            take_profit_price: None,
            stop_loss_price: None,
            amount_to_sell,
            input_decimals: DEFAULT_INPUT_DECIMALS,
            output_decimals: DEFAULT_OUTPUT_DECIMALS,
        }
    }

    #[must_use]
    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    #[must_use]
    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss_price = Some(price);
        self
    }

    #[must_use]
    pub fn with_decimals(mut self, input_decimals: u32, output_decimals: u32) -> Self {
        self.input_decimals = input_decimals;
        self.output_decimals = output_decimals;
        self
    }
}

/// Leg kind. Also the persisted `order_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Buy,
    TakeProfit,
    StopLoss,
}

impl OrderKind {
    /// Exit legs run in the opposite token direction to the entry leg.
    pub const fn is_exit(self) -> bool {
        matches!(self, Self::TakeProfit | Self::StopLoss)
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::TakeProfit => write!(f, "TAKE_PROFIT"),
            Self::StopLoss => write!(f, "STOP_LOSS"),
        }
    }
}

/// One computed leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedOrder {
    pub kind: OrderKind,
    /// Offered quantity of the leg's input token, fixed-point.
    #[serde(with = "amount_text")]
    pub making_amount: u128,
    /// Requested quantity of the leg's output token, fixed-point.
    #[serde(with = "amount_text")]
    pub taking_amount: u128,
    pub target_price: Decimal,
    /// Human-scale yield, computed directly rather than reconstructed from
    /// `taking_amount`.
    pub expected_output_amount: Decimal,
    pub description: String,
}

/// Aggregate figures over the computed legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSummary {
    pub total_orders: usize,
    pub total_input_amount: Decimal,
    pub total_expected_output: Decimal,
    pub risk_reward_ratio: Option<Decimal>,
}

/// Result of one calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCalculationSet {
    pub buy_order: CalculatedOrder,
    pub take_profit_order: Option<CalculatedOrder>,
    pub stop_loss_order: Option<CalculatedOrder>,
    pub summary: CalculationSummary,
}

impl OrderCalculationSet {
    /// Present legs in submission order: BUY, TAKE_PROFIT, STOP_LOSS.
    pub fn orders(&self) -> Vec<&CalculatedOrder> {
        std::iter::once(&self.buy_order)
            .chain(self.take_profit_order.as_ref())
            .chain(self.stop_loss_order.as_ref())
            .collect()
    }
}

/// Stateless calculator from [`CalculationRequest`] to [`OrderCalculationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCalculationEngine {
    max_decimals: u32,
}

impl Default for OrderCalculationEngine {
    fn default() -> Self {
        Self {
            max_decimals: MAX_DECIMALS,
        }
    }
}

impl OrderCalculationEngine {
    /// Engine accepting token precisions up to `max_decimals` (capped at 18).
    pub fn new(max_decimals: u32) -> Self {
        Self {
            max_decimals: max_decimals.min(MAX_DECIMALS),
        }
    }

    pub const fn max_decimals(&self) -> u32 {
        self.max_decimals
    }

    /// Check request invariants, reporting the first violation.
    ///
    /// Order: amount, buy price, current price, take-profit vs buy,
    /// stop-loss vs buy, take-profit vs stop-loss, then precisions.
    ///
    /// # Errors
    /// Returns the first violated rule as a [`CalculationError`].
    pub fn validate(&self, request: &CalculationRequest) -> Result<(), CalculationError> {
        ensure_positive("amount_to_sell", request.amount_to_sell)?;
        ensure_positive("buy_price", request.buy_price)?;
        ensure_positive("current_price", request.current_price)?;

        if let Some(take_profit) = request.take_profit_price {
            if take_profit <= request.buy_price {
                return Err(CalculationError::InvalidTakeProfit {
                    take_profit,
                    buy_price: request.buy_price,
                });
            }
        }

        if let Some(stop_loss) = request.stop_loss_price {
            if stop_loss >= request.buy_price || stop_loss <= Decimal::ZERO {
                return Err(CalculationError::InvalidStopLoss {
                    stop_loss,
                    buy_price: request.buy_price,
                });
            }
        }

        if let (Some(take_profit), Some(stop_loss)) =
            (request.take_profit_price, request.stop_loss_price)
        {
            if take_profit <= stop_loss {
                return Err(CalculationError::InconsistentTargets {
                    take_profit,
                    stop_loss,
                });
            }
        }

        self.ensure_decimals("input_decimals", request.input_decimals)?;
        self.ensure_decimals("output_decimals", request.output_decimals)?;

        Ok(())
    }

    /// Validate and compute every leg plus the summary.
    ///
    /// # Errors
    /// Propagates the first validation failure without computing anything,
    /// or an overflow if the scaled amounts exceed `u128`.
    pub fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<OrderCalculationSet, CalculationError> {
        self.validate(request)?;

        let buy_order = self.calculate_buy_order(request)?;
        let take_profit_order = self.calculate_take_profit_order(request)?;
        let stop_loss_order = self.calculate_stop_loss_order(request)?;

        let total_orders = 1
            + usize::from(take_profit_order.is_some())
            + usize::from(stop_loss_order.is_some());

        // Under the two-token model only the BUY leg spends the entry input
        // token and only the BUY leg yields the entry output token.
        let total_input_amount =
            scaling::from_scaled_units(buy_order.making_amount, request.input_decimals)?;
        let total_expected_output = buy_order.expected_output_amount;

        let risk_reward_ratio = match (request.take_profit_price, request.stop_loss_price) {
            (Some(take_profit), Some(stop_loss)) => {
                let reward = take_profit - request.buy_price;
                let risk = request.buy_price - stop_loss;
                Some(reward.checked_div(risk).ok_or(
                    CalculationError::ArithmeticOverflow {
                        operation: "risk_reward_ratio",
                    },
                )?)
            }
            _ => None,
        };

        Ok(OrderCalculationSet {
            buy_order,
            take_profit_order,
            stop_loss_order,
            summary: CalculationSummary {
                total_orders,
                total_input_amount,
                total_expected_output,
                risk_reward_ratio,
            },
        })
    }

    /// Entry leg: sell `amount_to_sell` of the input token at `buy_price`.
    ///
    /// # Errors
    /// Fails on scaling overflow or unsupported precision.
    pub fn calculate_buy_order(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculatedOrder, CalculationError> {
        let expected = checked_product(
            request.amount_to_sell,
            request.buy_price,
            "amount_to_sell * buy_price",
        )?;

        Ok(CalculatedOrder {
            kind: OrderKind::Buy,
            making_amount: leg_amount(request.amount_to_sell, request.input_decimals)?,
            taking_amount: leg_amount(expected, request.output_decimals)?,
            target_price: request.buy_price,
            expected_output_amount: expected,
            description: format!(
                "BUY at {}: sell {} for ~{}",
                request.buy_price.normalize(),
                request.amount_to_sell.normalize(),
                expected.normalize(),
            ),
        })
    }

    /// Take-profit exit leg, or `None` when the request carries no target.
    ///
    /// # Errors
    /// Fails on scaling overflow or unsupported precision.
    pub fn calculate_take_profit_order(
        &self,
        request: &CalculationRequest,
    ) -> Result<Option<CalculatedOrder>, CalculationError> {
        request
            .take_profit_price
            .map(|target| exit_order(request, OrderKind::TakeProfit, target))
            .transpose()
    }

    /// Stop-loss exit leg, or `None` when the request carries no target.
    ///
    /// # Errors
    /// Fails on scaling overflow or unsupported precision.
    pub fn calculate_stop_loss_order(
        &self,
        request: &CalculationRequest,
    ) -> Result<Option<CalculatedOrder>, CalculationError> {
        request
            .stop_loss_price
            .map(|target| exit_order(request, OrderKind::StopLoss, target))
            .transpose()
    }

    fn ensure_decimals(&self, field: &'static str, decimals: u32) -> Result<(), CalculationError> {
        if decimals > self.max_decimals {
            return Err(CalculationError::UnsupportedDecimals {
                field,
                decimals,
                max: self.max_decimals,
            });
        }
        Ok(())
    }
}

/// Shared exit-leg routine.
///
/// Disposes of the entry leg's expected acquisition, with the precisions
/// swapped: making at `output_decimals`, taking at `input_decimals`.
fn exit_order(
    request: &CalculationRequest,
    kind: OrderKind,
    target_price: Decimal,
) -> Result<CalculatedOrder, CalculationError> {
    let disposal = checked_product(
        request.amount_to_sell,
        request.buy_price,
        "amount_to_sell * buy_price",
    )?;
    let expected = checked_product(disposal, target_price, "disposal * target_price")?;

    Ok(CalculatedOrder {
        kind,
        making_amount: leg_amount(disposal, request.output_decimals)?,
        taking_amount: leg_amount(expected, request.input_decimals)?,
        target_price,
        expected_output_amount: expected,
        description: format!(
            "{kind} at {}: sell {} for ~{}",
            target_price.normalize(),
            disposal.normalize(),
            expected.normalize(),
        ),
    })
}

fn ensure_positive(field: &'static str, value: Decimal) -> Result<(), CalculationError> {
    if value <= Decimal::ZERO {
        return Err(CalculationError::InvalidAmount { field, value });
    }
    Ok(())
}

/// Scaled leg amount, bounded so the stored record can carry it as a
/// decimal (96-bit mantissa).
fn leg_amount(amount: Decimal, decimals: u32) -> Result<u128, CalculationError> {
    let scaled = scaling::to_scaled_amount(amount, decimals)?;
    if scaled > MAX_LEG_AMOUNT {
        return Err(CalculationError::ScaledOverflow {
            value: amount,
            decimals,
        });
    }
    Ok(scaled)
}

/// Exact product of two decimals.
///
/// `Decimal::checked_mul` rounds once the product needs more than 28
/// fractional digits or a wider mantissa. A rounded product could floor to
/// a larger scaled amount than the exact one, so any dropped non-zero digit
/// is reported as an overflow instead.
fn checked_product(
    lhs: Decimal,
    rhs: Decimal,
    operation: &'static str,
) -> Result<Decimal, CalculationError> {
    let overflow = CalculationError::ArithmeticOverflow { operation };
    let product = lhs.checked_mul(rhs).ok_or(overflow.clone())?;

    let dropped = (lhs.scale() + rhs.scale()).saturating_sub(product.scale());
    if dropped > 0 {
        let (a, b) = (lhs.mantissa().unsigned_abs(), rhs.mantissa().unsigned_abs());
        let twos = factor_count(a, 2).saturating_add(factor_count(b, 2));
        let fives = factor_count(a, 5).saturating_add(factor_count(b, 5));
        // The dropped digits are all zero iff 10^dropped divides a × b.
        if twos < dropped || fives < dropped {
            return Err(overflow);
        }
    }
    Ok(product)
}

/// Multiplicity of `prime` in `value`; zero is divisible by anything.
fn factor_count(mut value: u128, prime: u128) -> u32 {
    if value == 0 {
        return u32::MAX;
    }
    let mut count = 0;
    while value % prime == 0 {
        value /= prime;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn full_request() -> CalculationRequest {
        CalculationRequest::new(dec!(100), dec!(95), dec!(1))
            .with_take_profit(dec!(110))
            .with_stop_loss(dec!(85))
    }

    #[test]
    fn test_reference_scenario_buy_leg() {
        let set = OrderCalculationEngine::default()
            .calculate(&full_request())
            .unwrap();

        let buy = &set.buy_order;
        assert_eq!(buy.kind, OrderKind::Buy);
        assert_eq!(buy.making_amount, 1_000_000_000);
        assert_eq!(buy.taking_amount, 95_000_000);
        assert_eq!(buy.target_price, dec!(95));
        assert_eq!(buy.expected_output_amount, dec!(95));
    }

    #[test]
    fn test_reference_scenario_exit_legs() {
        let set = OrderCalculationEngine::default()
            .calculate(&full_request())
            .unwrap();

        let tp = set.take_profit_order.as_ref().unwrap();
        assert_eq!(tp.making_amount, 95_000_000);
        assert_eq!(tp.expected_output_amount, dec!(10450));
        assert_eq!(tp.taking_amount, 10_450_000_000_000);
        assert_eq!(tp.target_price, dec!(110));

        let sl = set.stop_loss_order.as_ref().unwrap();
        assert_eq!(sl.making_amount, 95_000_000);
        assert_eq!(sl.expected_output_amount, dec!(8075));
        assert_eq!(sl.taking_amount, 8_075_000_000_000);
    }

    #[test]
    fn test_reference_scenario_summary() {
        let set = OrderCalculationEngine::default()
            .calculate(&full_request())
            .unwrap();

        assert_eq!(set.summary.total_orders, 3);
        assert_eq!(set.summary.total_input_amount, dec!(1));
        assert_eq!(set.summary.total_expected_output, dec!(95));
        assert_eq!(set.summary.risk_reward_ratio, Some(dec!(1.5)));
    }

    #[test]
    fn test_entry_only_request() {
        let request = CalculationRequest::new(dec!(100), dec!(95), dec!(2.5));
        let set = OrderCalculationEngine::default().calculate(&request).unwrap();

        assert!(set.take_profit_order.is_none());
        assert!(set.stop_loss_order.is_none());
        assert_eq!(set.summary.total_orders, 1);
        assert_eq!(set.summary.risk_reward_ratio, None);
        assert_eq!(set.orders().len(), 1);
    }

    #[test]
    fn test_take_profit_only_has_no_ratio() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(1)).with_take_profit(dec!(120));
        let set = OrderCalculationEngine::default().calculate(&request).unwrap();

        assert_eq!(set.summary.total_orders, 2);
        assert_eq!(set.summary.risk_reward_ratio, None);
        assert_eq!(set.orders()[1].kind, OrderKind::TakeProfit);
    }

    #[test]
    fn test_stop_loss_above_buy_rejected() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(1)).with_stop_loss(dec!(96));
        let err = OrderCalculationEngine::default().calculate(&request).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidStopLoss { .. }));
    }

    #[test]
    fn test_stop_loss_equal_to_buy_rejected() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(1)).with_stop_loss(dec!(95));
        let err = OrderCalculationEngine::default().validate(&request).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidStopLoss { .. }));
    }

    #[test]
    fn test_zero_stop_loss_rejected() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(1)).with_stop_loss(dec!(0));
        let err = OrderCalculationEngine::default().validate(&request).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidStopLoss { .. }));
    }

    #[test]
    fn test_take_profit_equal_to_buy_rejected() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(1)).with_take_profit(dec!(95));
        let err = OrderCalculationEngine::default().validate(&request).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidTakeProfit { .. }));
    }

    #[test]
    fn test_amount_reported_before_take_profit() {
        let request =
            CalculationRequest::new(dec!(100), dec!(95), dec!(0)).with_take_profit(dec!(90));
        let err = OrderCalculationEngine::default().validate(&request).unwrap_err();
        assert_eq!(
            err,
            CalculationError::InvalidAmount {
                field: "amount_to_sell",
                value: dec!(0),
            }
        );
    }

    #[test]
    fn test_positivity_checked_in_field_order() {
        let engine = OrderCalculationEngine::default();

        let request = CalculationRequest::new(dec!(0), dec!(-1), dec!(1));
        assert_eq!(engine.validate(&request).unwrap_err().field(), "buy_price");

        let request = CalculationRequest::new(dec!(0), dec!(95), dec!(1));
        assert_eq!(engine.validate(&request).unwrap_err().field(), "current_price");
    }

    #[test]
    fn test_current_price_does_not_affect_amounts() {
        let engine = OrderCalculationEngine::default();
        let a = engine
            .calculate(&CalculationRequest::new(dec!(100), dec!(95), dec!(1)))
            .unwrap();
        let b = engine
            .calculate(&CalculationRequest::new(dec!(3), dec!(95), dec!(1)))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsupported_decimals_rejected_after_targets() {
        let engine = OrderCalculationEngine::new(12);
        let request = full_request().with_decimals(9, 13);
        let err = engine.validate(&request).unwrap_err();
        assert_eq!(
            err,
            CalculationError::UnsupportedDecimals {
                field: "output_decimals",
                decimals: 13,
                max: 12,
            }
        );
    }

    #[test]
    fn test_summary_uses_request_input_decimals() {
        let request = CalculationRequest::new(dec!(1), dec!(2), dec!(1.5)).with_decimals(6, 9);
        let set = OrderCalculationEngine::default().calculate(&request).unwrap();

        assert_eq!(set.buy_order.making_amount, 1_500_000);
        assert_eq!(set.summary.total_input_amount, dec!(1.5));
    }

    #[test]
    fn test_fractional_amounts_truncate() {
        // 0.333333333 × 0.7 = 0.2333333331 → 233_333 at 6 decimals.
        let request = CalculationRequest::new(dec!(1), dec!(0.7), dec!(0.333333333));
        let set = OrderCalculationEngine::default().calculate(&request).unwrap();

        assert_eq!(set.buy_order.making_amount, 333_333_333);
        assert_eq!(set.buy_order.taking_amount, 233_333);
        assert_eq!(set.buy_order.expected_output_amount, dec!(0.2333333331));
    }

    #[test]
    fn test_rounded_product_rejected() {
        // Exact product 0.99999999999999999999999999999 needs 29 places;
        // a rounded 1.0 would floor to 1_000_000 instead of 999_999.
        let request =
            CalculationRequest::new(dec!(1), dec!(33.333333333333333333333333333), dec!(0.03));
        let err = OrderCalculationEngine::default().calculate(&request).unwrap_err();
        assert_eq!(
            err,
            CalculationError::ArithmeticOverflow {
                operation: "amount_to_sell * buy_price",
            }
        );
    }

    #[test]
    fn test_product_dropping_only_zeros_is_exact() {
        let product = checked_product(
            dec!(0.5),
            dec!(0.0000000000000000000000000002),
            "test",
        )
        .unwrap();
        assert_eq!(product, Decimal::new(1, 28));
    }

    #[test]
    fn test_leg_amount_beyond_record_range_rejected() {
        let request = CalculationRequest::new(dec!(1000), dec!(1000), dec!(1000))
            .with_take_profit(dec!(100000))
            .with_decimals(18, 6);
        let err = OrderCalculationEngine::default().calculate(&request).unwrap_err();
        assert_eq!(
            err,
            CalculationError::ScaledOverflow {
                value: dec!(100000000000),
                decimals: 18,
            }
        );
    }

    #[test]
    fn test_calculation_set_serializes_amounts_as_text() {
        let set = OrderCalculationEngine::default()
            .calculate(&full_request())
            .unwrap();
        let json = serde_json::to_value(&set).unwrap();

        assert_eq!(json["buyOrder"]["makingAmount"], "1000000000");
        assert_eq!(json["takeProfitOrder"]["kind"], "TAKE_PROFIT");
        assert_eq!(json["summary"]["totalOrders"], 3);
    }

    #[test]
    fn test_request_defaults_decimals() {
        let request: CalculationRequest = serde_json::from_str(
            r#"{"currentPrice": "100", "buyPrice": "95", "amountToSell": "1"}"#,
        )
        .unwrap();
        assert_eq!(request.input_decimals, 9);
        assert_eq!(request.output_decimals, 6);
        assert!(request.take_profit_price.is_none());
    }
}
