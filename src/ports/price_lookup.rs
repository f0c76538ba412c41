//! Price Lookup Port - Market Price Interface
//!
//! Supplies the current price of a token plus whatever liquidity and
//! confidence metadata the price source exposes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::routing::TokenId;

/// How much the price source trusts its own quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
  High,
  Medium,
  Low,
}

/// Point-in-time price for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
  /// Token the quote is for.
  pub token: TokenId,
  /// Price in the source's quote currency.
  pub price: Decimal,
  /// Source-reported confidence, if any.
  pub confidence: Option<ConfidenceLevel>,
  /// Liquidity depth estimate, if any.
  pub depth: Option<Decimal>,
  /// When the quote was fetched (Unix ms).
  pub timestamp_ms: u64,
}

/// Trait for market price providers.
#[async_trait]
pub trait PriceLookup: Send + Sync + 'static {
  /// Fetch the current quote for a token.
  ///
  /// # Errors
  /// Returns error if the source is unreachable or has no price for the token.
  async fn quote(&self, token: &TokenId) -> anyhow::Result<MarketQuote>;

  /// Check if the price source is reachable.
  async fn is_healthy(&self) -> bool;
}
