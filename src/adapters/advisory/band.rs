//! Band advisor: fixed-percentage entry, take-profit and stop-loss bands
//! around the live price, sized down when the quote is uncertain.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use tracing::{debug, instrument};

use crate::config::AdvisoryConfig;
use crate::ports::advisory::{AdvisoryInput, AdvisoryService, Suggestion};
use crate::ports::price_lookup::ConfidenceLevel;

/// Price precision of suggested levels.
const PRICE_DP: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandAdvisor {
    entry_discount: Decimal,
    take_profit_pct: Decimal,
    stop_loss_pct: Decimal,
}

impl Default for BandAdvisor {
    fn default() -> Self {
        Self {
            entry_discount: dec!(0.02),
            take_profit_pct: dec!(0.10),
            stop_loss_pct: dec!(0.05),
        }
    }
}

impl BandAdvisor {
    pub fn new(entry_discount: Decimal, take_profit_pct: Decimal, stop_loss_pct: Decimal) -> Self {
        Self {
            entry_discount,
            take_profit_pct,
            stop_loss_pct,
        }
    }

    /// Build from the `f64` config values, falling back to the defaults
    /// for values that do not convert.
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        let defaults = Self::default();
        Self {
            entry_discount: Decimal::from_f64(config.entry_discount)
                .unwrap_or(defaults.entry_discount),
            take_profit_pct: Decimal::from_f64(config.take_profit_pct)
                .unwrap_or(defaults.take_profit_pct),
            stop_loss_pct: Decimal::from_f64(config.stop_loss_pct)
                .unwrap_or(defaults.stop_loss_pct),
        }
    }

    /// Share of the budget committed at a given quote confidence.
    pub fn size_factor(confidence: Option<ConfidenceLevel>) -> Decimal {
        match confidence {
            Some(ConfidenceLevel::High) => Decimal::ONE,
            Some(ConfidenceLevel::Medium) => dec!(0.75),
            Some(ConfidenceLevel::Low) | None => dec!(0.5),
        }
    }

    /// Compute the suggestion without any I/O.
    ///
    /// # Errors
    /// Non-positive price or budget.
    pub fn compute(&self, input: &AdvisoryInput) -> anyhow::Result<Suggestion> {
        let price = input.quote.price;
        anyhow::ensure!(price > Decimal::ZERO, "Quote price must be positive, got {price}");
        anyhow::ensure!(
            input.budget > Decimal::ZERO,
            "Budget must be positive, got {}",
            input.budget
        );

        let buy_price = (price * (Decimal::ONE - self.entry_discount)).round_dp(PRICE_DP);
        let take_profit_price = (buy_price * (Decimal::ONE + self.take_profit_pct)).round_dp(PRICE_DP);
        let stop_loss_price = (buy_price * (Decimal::ONE - self.stop_loss_pct)).round_dp(PRICE_DP);
        let factor = Self::size_factor(input.quote.confidence);
        let amount_to_sell = (input.budget * factor).normalize();

        let confidence = input
            .quote
            .confidence
            .map_or_else(|| "unknown".to_string(), |c| format!("{c:?}").to_lowercase());

        let rationale = format!(
            "Entry {}% below {price}; take profit +{}%, stop loss -{}% from entry. \
             Confidence {confidence}, committing {}% of budget.",
            (self.entry_discount * dec!(100)).normalize(),
            (self.take_profit_pct * dec!(100)).normalize(),
            (self.stop_loss_pct * dec!(100)).normalize(),
            (factor * dec!(100)).normalize(),
        );

        Ok(Suggestion {
            buy_price,
            take_profit_price: Some(take_profit_price),
            stop_loss_price: Some(stop_loss_price),
            amount_to_sell,
            rationale,
        })
    }
}

#[async_trait]
impl AdvisoryService for BandAdvisor {
    #[instrument(skip(self, input), fields(token = %input.quote.token))]
    async fn suggest(&self, input: &AdvisoryInput) -> anyhow::Result<Suggestion> {
        let suggestion = self.compute(input)?;
        debug!(
            buy = %suggestion.buy_price,
            amount = %suggestion.amount_to_sell,
            "Suggestion computed"
        );
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::price_lookup::MarketQuote;

    fn input(price: Decimal, confidence: Option<ConfidenceLevel>) -> AdvisoryInput {
        AdvisoryInput {
            quote: MarketQuote {
                token: "SOL".to_string(),
                price,
                confidence,
                depth: None,
                timestamp_ms: 0,
            },
            budget: dec!(2),
        }
    }

    #[test]
    fn test_bands_around_price() {
        let s = BandAdvisor::default()
            .compute(&input(dec!(100), Some(ConfidenceLevel::High)))
            .unwrap();
        assert_eq!(s.buy_price, dec!(98));
        assert_eq!(s.take_profit_price, Some(dec!(107.8)));
        assert_eq!(s.stop_loss_price, Some(dec!(93.1)));
        assert_eq!(s.amount_to_sell, dec!(2));
        assert!(s.rationale.contains("high"));
    }

    #[test]
    fn test_low_confidence_halves_size() {
        let s = BandAdvisor::default()
            .compute(&input(dec!(100), Some(ConfidenceLevel::Low)))
            .unwrap();
        assert_eq!(s.amount_to_sell, dec!(1));
    }

    #[test]
    fn test_suggestion_passes_engine_validation() {
        use crate::domain::calculation::OrderCalculationEngine;

        let s = BandAdvisor::default()
            .compute(&input(dec!(142.37), None))
            .unwrap();
        let request = s.into_request(dec!(142.37), 9, 6);
        assert!(OrderCalculationEngine::default().calculate(&request).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let advisor = BandAdvisor::default();
        assert!(advisor.compute(&input(Decimal::ZERO, None)).is_err());

        let mut bad = input(dec!(1), None);
        bad.budget = Decimal::ZERO;
        assert!(advisor.compute(&bad).is_err());
    }
}
