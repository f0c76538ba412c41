//! Trigger Order Gateway - Adapter for the Upstream Trigger API
//!
//! Implements the `TriggerGateway` port on top of the shared `ApiClient`.
//! Every unsigned transaction handed back to callers is checked to be
//! well-formed base64 before it leaves this adapter.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::types::{
    CancelOrderRequest, CancelOrderResponse, CreateOrderParams, CreateOrderRequest,
    CreateOrderResponse, ExecuteRequest, ExecuteResponse,
};
use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::domain::routing::{LegSubmission, OwnerId};
use crate::ports::trigger_gateway::{CancelTicket, CreatedOrder, ExecutionReceipt, TriggerGateway};

/// Priority fee mode sent with every transaction-building request.
const COMPUTE_UNIT_PRICE: &str = "auto";

/// Trigger API gateway backed by the shared HTTP client.
pub struct TriggerApiGateway {
    client: Arc<ApiClient>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl TriggerApiGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            metrics: None,
        }
    }

    /// Record upstream latency on the given registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn observe(&self, operation: &str, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics
                .gateway_latency
                .with_label_values(&[operation])
                .observe(started.elapsed().as_secs_f64());
        }
    }
}

/// Reject transaction payloads that are not valid base64.
pub fn check_transaction_payload(payload: &str) -> Result<()> {
    anyhow::ensure!(!payload.is_empty(), "Upstream returned an empty transaction");
    STANDARD
        .decode(payload)
        .context("Upstream transaction is not valid base64")?;
    Ok(())
}

#[async_trait]
impl TriggerGateway for TriggerApiGateway {
    #[instrument(skip(self, leg), fields(kind = %leg.kind, input = %leg.input_token))]
    async fn create_order(&self, leg: &LegSubmission) -> Result<CreatedOrder> {
        let body = CreateOrderRequest {
            input_mint: leg.input_token.clone(),
            output_mint: leg.output_token.clone(),
            maker: leg.owner.clone(),
            payer: leg.owner.clone(),
            params: CreateOrderParams {
                making_amount: leg.making_amount.to_string(),
                taking_amount: leg.taking_amount.to_string(),
            },
            compute_unit_price: COMPUTE_UNIT_PRICE.to_string(),
        };

        let started = Instant::now();
        let result: Result<CreateOrderResponse> =
            self.client.post_json("/createOrder", &body).await;
        self.observe("create_order", started);

        let resp = result.context("createOrder request failed")?;
        check_transaction_payload(&resp.transaction)?;

        info!(
            order = %resp.order,
            request_id = %resp.request_id,
            making = leg.making_amount,
            taking = leg.taking_amount,
            "Trigger order created"
        );

        Ok(CreatedOrder {
            order_handle: resp.order,
            unsigned_transaction: resp.transaction,
            request_id: resp.request_id,
        })
    }

    #[instrument(skip(self, signed_transaction))]
    async fn execute_order(
        &self,
        signed_transaction: &str,
        request_id: &str,
    ) -> Result<ExecutionReceipt> {
        check_transaction_payload(signed_transaction)
            .context("Signed transaction rejected before submission")?;

        let body = ExecuteRequest {
            signed_transaction: signed_transaction.to_string(),
            request_id: request_id.to_string(),
        };

        let started = Instant::now();
        let result: Result<ExecuteResponse> = self.client.post_json("/execute", &body).await;
        self.observe("execute", started);

        let resp = result.context("execute request failed")?;
        let receipt = ExecutionReceipt {
            signature: resp.signature,
            status: resp.status,
            error: resp.error,
        };

        if receipt.succeeded() {
            info!(signature = ?receipt.signature, "Signed transaction landed");
        } else {
            warn!(status = %receipt.status, error = ?receipt.error, "Execution not confirmed");
        }

        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, owner: &OwnerId, order_handle: &str) -> Result<CancelTicket> {
        let body = CancelOrderRequest {
            maker: owner.clone(),
            order: order_handle.to_string(),
            compute_unit_price: COMPUTE_UNIT_PRICE.to_string(),
        };

        let started = Instant::now();
        let result: Result<CancelOrderResponse> =
            self.client.post_json("/cancelOrder", &body).await;
        self.observe("cancel_order", started);

        let resp = result.context("cancelOrder request failed")?;
        check_transaction_payload(&resp.transaction)?;
        debug!(request_id = %resp.request_id, "Cancel transaction built");

        Ok(CancelTicket {
            unsigned_transaction: resp.transaction,
            request_id: resp.request_id,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_base64_payload() {
        assert!(check_transaction_payload("AQIDBA==").is_ok());
    }

    #[test]
    fn test_rejects_malformed_payload() {
        assert!(check_transaction_payload("").is_err());
        assert!(check_transaction_payload("not base64!").is_err());
    }
}
