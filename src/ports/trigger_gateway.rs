//! Trigger Gateway Port - Upstream Trigger-Order API
//!
//! The upstream service monitors prices and fills orders; this side only
//! creates them, forwards signed transactions, and requests cancellation.
//!
//! Each leg is submitted independently. A failure on one leg says nothing
//! about the others and nothing is rolled back here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::routing::{LegSubmission, OwnerId};

/// Upstream acknowledgement of a created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
  /// Opaque on-chain order handle.
  pub order_handle: String,
  /// Base64 transaction the owner must sign.
  pub unsigned_transaction: String,
  /// Upstream request id, needed to execute the signed transaction.
  pub request_id: String,
}

/// Result of forwarding a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
  /// Transaction signature, if it landed.
  pub signature: Option<String>,
  /// Upstream status string ("Success" / "Failed").
  pub status: String,
  /// Upstream error message on failure.
  pub error: Option<String>,
}

impl ExecutionReceipt {
  pub fn succeeded(&self) -> bool {
    self.status.eq_ignore_ascii_case("success") && self.error.is_none()
  }
}

/// Unsigned cancel transaction for the owner to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelTicket {
  pub unsigned_transaction: String,
  pub request_id: String,
}

/// Trait for trigger-order API providers.
#[async_trait]
pub trait TriggerGateway: Send + Sync + 'static {
  /// Create one limit order leg upstream.
  ///
  /// # Errors
  /// Returns error on transport failure or upstream rejection.
  async fn create_order(&self, leg: &LegSubmission) -> anyhow::Result<CreatedOrder>;

  /// Forward an owner-signed transaction for a previous request.
  async fn execute_order(
    &self,
    signed_transaction: &str,
    request_id: &str,
  ) -> anyhow::Result<ExecutionReceipt>;

  /// Request a cancel transaction for an open order.
  async fn cancel_order(
    &self,
    owner: &OwnerId,
    order_handle: &str,
  ) -> anyhow::Result<CancelTicket>;

  /// Check if the upstream API is reachable.
  async fn is_healthy(&self) -> bool;
}
