//! Price API lookup.
//!
//! Implements `PriceLookup` against a price endpoint that answers
//! `?ids=<token>&showExtraInfo=true` with a per-token map.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::client::ApiClient;
use super::types::{PriceEntry, PriceResponse};
use crate::domain::routing::TokenId;
use crate::ports::price_lookup::{ConfidenceLevel, MarketQuote, PriceLookup};

pub struct PriceApiLookup {
    client: Arc<ApiClient>,
}

impl PriceApiLookup {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

fn parse_confidence(level: &str) -> Option<ConfidenceLevel> {
    match level.to_ascii_lowercase().as_str() {
        "high" => Some(ConfidenceLevel::High),
        "medium" => Some(ConfidenceLevel::Medium),
        "low" => Some(ConfidenceLevel::Low),
        _ => None,
    }
}

/// Convert one price entry into a quote.
///
/// # Errors
/// A missing, unparsable, or non-positive price.
pub fn quote_from_entry(token: &TokenId, entry: &PriceEntry, timestamp_ms: u64) -> Result<MarketQuote> {
    let price = Decimal::from_str(&entry.price)
        .with_context(|| format!("Unparsable price for {token}: {}", entry.price))?;
    anyhow::ensure!(price > Decimal::ZERO, "Non-positive price for {token}: {price}");

    let extra = entry.extra_info.as_ref();
    let confidence = extra
        .and_then(|e| e.confidence_level.as_deref())
        .and_then(parse_confidence);
    let depth = extra
        .and_then(|e| e.depth_text())
        .and_then(|d| Decimal::from_str(&d).ok());

    Ok(MarketQuote {
        token: token.clone(),
        price,
        confidence,
        depth,
        timestamp_ms,
    })
}

#[async_trait]
impl PriceLookup for PriceApiLookup {
    #[instrument(skip(self))]
    async fn quote(&self, token: &TokenId) -> Result<MarketQuote> {
        let path = format!("?ids={token}&showExtraInfo=true");
        let resp: PriceResponse = self
            .client
            .get_json(&path)
            .await
            .context("Price request failed")?;

        let entry = resp
            .data
            .get(token)
            .and_then(Option::as_ref)
            .with_context(|| format!("No price available for {token}"))?;

        let timestamp_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let quote = quote_from_entry(token, entry, timestamp_ms)?;
        debug!(price = %quote.price, confidence = ?quote.confidence, "Quote received");
        Ok(quote)
    }

    async fn is_healthy(&self) -> bool {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::api::types::PriceExtraInfo;
    use rust_decimal_macros::dec;

    fn entry(price: &str, confidence: Option<&str>) -> PriceEntry {
        PriceEntry {
            id: "SOL".to_string(),
            price: price.to_string(),
            extra_info: Some(PriceExtraInfo {
                confidence_level: confidence.map(str::to_string),
                depth: Some(serde_json::json!("5000.25")),
            }),
        }
    }

    #[test]
    fn test_quote_from_entry() {
        let quote = quote_from_entry(&"SOL".to_string(), &entry("142.5", Some("medium")), 7).unwrap();
        assert_eq!(quote.price, dec!(142.5));
        assert_eq!(quote.confidence, Some(ConfidenceLevel::Medium));
        assert_eq!(quote.depth, Some(dec!(5000.25)));
        assert_eq!(quote.timestamp_ms, 7);
    }

    #[test]
    fn test_unknown_confidence_is_dropped() {
        let quote = quote_from_entry(&"SOL".to_string(), &entry("1", Some("extreme")), 0).unwrap();
        assert_eq!(quote.confidence, None);
    }

    #[test]
    fn test_rejects_bad_prices() {
        assert!(quote_from_entry(&"SOL".to_string(), &entry("abc", None), 0).is_err());
        assert!(quote_from_entry(&"SOL".to_string(), &entry("0", None), 0).is_err());
    }
}
