//! Upstream API Request/Response Types
//!
//! Serialization types for the trigger-order API and the price API.
//! Amounts cross the wire as exact integer strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Create-order request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  /// Token being sold.
  pub input_mint: String,
  /// Token being bought.
  pub output_mint: String,
  /// Wallet that owns the order.
  pub maker: String,
  /// Wallet paying fees and rent.
  pub payer: String,
  pub params: CreateOrderParams,
  /// Priority fee setting ("auto").
  pub compute_unit_price: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderParams {
  pub making_amount: String,
  pub taking_amount: String,
}

/// Create-order response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
  /// Order account address.
  pub order: String,
  /// Unsigned base64 transaction.
  pub transaction: String,
  pub request_id: String,
}

/// Execute request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
  pub signed_transaction: String,
  pub request_id: String,
}

/// Execute response.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
  pub signature: Option<String>,
  pub status: String,
  pub error: Option<String>,
}

/// Cancel-order request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
  pub maker: String,
  pub order: String,
  pub compute_unit_price: String,
}

/// Cancel-order response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderResponse {
  pub transaction: String,
  pub request_id: String,
}

/// Price API response: token id → entry (null when unknown).
#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
  pub data: HashMap<String, Option<PriceEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
  pub id: String,
  /// Price as a decimal string.
  pub price: String,
  pub extra_info: Option<PriceExtraInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceExtraInfo {
  /// "high", "medium" or "low".
  pub confidence_level: Option<String>,
  /// Depth or liquidity estimate; a number or a decimal string.
  #[serde(alias = "liquidity")]
  pub depth: Option<serde_json::Value>,
}

impl PriceExtraInfo {
  /// Depth as text, when upstream reports a scalar.
  pub fn depth_text(&self) -> Option<String> {
    match self.depth.as_ref()? {
      serde_json::Value::String(s) => Some(s.clone()),
      serde_json::Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }
}

/// Upstream error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
  pub error: Option<String>,
  pub cause: Option<String>,
  pub code: Option<i64>,
}

impl ApiErrorBody {
  /// Best human-readable message from a raw error body.
  pub fn describe(body: &str) -> String {
    match serde_json::from_str::<Self>(body) {
      Ok(Self {
        error: Some(error),
        cause,
        ..
      }) => match cause {
        Some(cause) => format!("{error} ({cause})"),
        None => error,
      },
      _ => body.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_create_order_request_serialization() {
    let req = CreateOrderRequest {
      input_mint: "mintA".to_string(),
      output_mint: "mintB".to_string(),
      maker: "wallet".to_string(),
      payer: "wallet".to_string(),
      params: CreateOrderParams {
        making_amount: "1000000000".to_string(),
        taking_amount: "95000000".to_string(),
      },
      compute_unit_price: "auto".to_string(),
    };

    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["inputMint"], "mintA");
    assert_eq!(json["params"]["makingAmount"], "1000000000");
    assert_eq!(json["computeUnitPrice"], "auto");
  }

  #[test]
  fn test_create_order_response_deserialization() {
    let json = r#"{"order": "ord_abc", "transaction": "AQID", "requestId": "req_1"}"#;
    let resp: CreateOrderResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.order, "ord_abc");
    assert_eq!(resp.request_id, "req_1");
  }

  #[test]
  fn test_price_response_with_unknown_token() {
    let json = r#"{"data": {
      "mintA": {"id": "mintA", "price": "142.5", "extraInfo": {"confidenceLevel": "high", "liquidity": 1250000.5}},
      "mintB": null
    }}"#;
    let resp: PriceResponse = serde_json::from_str(json).unwrap();
    assert!(resp.data["mintB"].is_none());
    let entry = resp.data["mintA"].as_ref().unwrap();
    assert_eq!(entry.price, "142.5");
    assert_eq!(
      entry.extra_info.as_ref().unwrap().confidence_level.as_deref(),
      Some("high")
    );
    assert_eq!(
      entry.extra_info.as_ref().unwrap().depth_text().as_deref(),
      Some("1250000.5")
    );
  }

  #[test]
  fn test_error_body_description() {
    assert_eq!(
      ApiErrorBody::describe(r#"{"error": "Insufficient balance", "cause": "makingAmount"}"#),
      "Insufficient balance (makingAmount)"
    );
    assert_eq!(ApiErrorBody::describe("gateway timeout"), "gateway timeout");
  }
}
