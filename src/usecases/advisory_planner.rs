//! Advisory Planner - Price-Driven Order Suggestions
//!
//! Flow:
//! 1. Quote the token
//! 2. Ask the advisory strategy for levels and size
//! 3. Turn the suggestion into an ordinary calculation request
//! 4. Run the engine on it

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::calculation::{CalculationRequest, OrderCalculationEngine, OrderCalculationSet};
use crate::domain::routing::TokenId;
use crate::ports::advisory::{AdvisoryInput, AdvisoryService, Suggestion};
use crate::ports::price_lookup::{MarketQuote, PriceLookup};

/// A suggestion together with the orders it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryPlan {
  pub quote: MarketQuote,
  pub suggestion: Suggestion,
  pub request: CalculationRequest,
  pub calculation: OrderCalculationSet,
}

pub struct AdvisoryPlanner<P: PriceLookup, A: AdvisoryService> {
  engine: OrderCalculationEngine,
  prices: Arc<P>,
  /// `None` when advisory is switched off.
  advisor: Option<Arc<A>>,
}

impl<P: PriceLookup, A: AdvisoryService> AdvisoryPlanner<P, A> {
  pub fn new(engine: OrderCalculationEngine, prices: Arc<P>, advisor: Option<Arc<A>>) -> Self {
    Self {
      engine,
      prices,
      advisor,
    }
  }

  pub const fn advisory_enabled(&self) -> bool {
    self.advisor.is_some()
  }

  /// Current market quote for a token.
  pub async fn quote(&self, token: &TokenId) -> Result<MarketQuote> {
    self.prices.quote(token).await
  }

  #[instrument(skip(self))]
  pub async fn plan(
    &self,
    token: &TokenId,
    budget: Decimal,
    input_decimals: u32,
    output_decimals: u32,
  ) -> Result<AdvisoryPlan> {
    let Some(advisor) = &self.advisor else {
      anyhow::bail!("Advisory suggestions are disabled");
    };

    let quote = self.prices.quote(token).await?;
    let suggestion = advisor
      .suggest(&AdvisoryInput {
        quote: quote.clone(),
        budget,
      })
      .await?;

    let request = suggestion
      .clone()
      .into_request(quote.price, input_decimals, output_decimals);
    let calculation = self.engine.calculate(&request)?;

    info!(
      price = %quote.price,
      buy = %suggestion.buy_price,
      orders = calculation.summary.total_orders,
      "Advisory plan built"
    );

    Ok(AdvisoryPlan {
      quote,
      suggestion,
      request,
      calculation,
    })
  }
}
