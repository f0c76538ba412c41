//! Advisory Port - Pluggable Entry/Exit Suggestions
//!
//! An advisory strategy proposes entry, take-profit, stop-loss and size
//! from market data. Its output becomes an ordinary `CalculationRequest`;
//! the engine gives it no special treatment.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::calculation::CalculationRequest;
use crate::ports::price_lookup::MarketQuote;

/// Inputs handed to an advisory strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryInput {
  /// Current quote for the token being traded.
  pub quote: MarketQuote,
  /// Maximum quantity of the input token the owner is willing to sell.
  pub budget: Decimal,
}

/// A suggested trade plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
  pub buy_price: Decimal,
  pub take_profit_price: Option<Decimal>,
  pub stop_loss_price: Option<Decimal>,
  pub amount_to_sell: Decimal,
  /// Free-text explanation, informational only.
  pub rationale: String,
}

impl Suggestion {
  /// Convert into a request for the calculation engine.
  pub fn into_request(
    self,
    current_price: Decimal,
    input_decimals: u32,
    output_decimals: u32,
  ) -> CalculationRequest {
    CalculationRequest {
      current_price,
      buy_price: self.buy_price,
      take_profit_price: self.take_profit_price,
      stop_loss_price: self.stop_loss_price,
      amount_to_sell: self.amount_to_sell,
      input_decimals,
      output_decimals,
    }
  }
}

/// Trait for advisory strategies.
#[async_trait]
pub trait AdvisoryService: Send + Sync + 'static {
  /// Produce a suggestion for the given market state.
  ///
  /// # Errors
  /// Returns error if the strategy cannot produce a plan for this input.
  async fn suggest(&self, input: &AdvisoryInput) -> anyhow::Result<Suggestion>;
}
