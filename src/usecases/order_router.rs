//! Order Router - Trigger Order Lifecycle
//!
//! Turns a trade intent into upstream trigger orders and tracks them:
//! - Previewing the computed legs (engine only)
//! - Submitting legs one by one and persisting the accepted ones
//! - Forwarding signed transactions for execution
//! - Cancelling pending orders
//! - Status updates and queries over the order store
//!
//! Legs are independent: a failed leg never rolls back the legs that
//! were already accepted upstream.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::calculation::{
  CalculatedOrder, CalculationRequest, OrderCalculationEngine, OrderCalculationSet, OrderKind,
};
use crate::domain::error::CalculationError;
use crate::domain::order::{OrderRecord, OrderStatus};
use crate::domain::routing::{LegSubmission, TradeIntent};
use crate::ports::order_store::{OrderQuery, OrderStore};
use crate::ports::trigger_gateway::{CancelTicket, ExecutionReceipt, TriggerGateway};

/// What happened to one leg of a placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegOutcome {
  /// Accepted upstream and stored as PENDING.
  Placed { record: Box<OrderRecord> },
  /// Rejected upstream or not stored.
  Failed { error: String },
  /// Not submitted (dry run).
  Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegResult {
  pub kind: OrderKind,
  pub outcome: LegOutcome,
}

/// Aggregated report from one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
  /// The engine output the legs were built from.
  pub calculation: OrderCalculationSet,
  /// Per-leg outcomes, in submission order.
  pub legs: Vec<LegResult>,
  pub placed: usize,
  pub failed: usize,
  pub timestamp: chrono::DateTime<Utc>,
}

impl PlacementReport {
  pub fn records(&self) -> impl Iterator<Item = &OrderRecord> {
    self.legs.iter().filter_map(|leg| match &leg.outcome {
      LegOutcome::Placed { record } => Some(record.as_ref()),
      _ => None,
    })
  }
}

/// Result of forwarding a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
  pub order: OrderRecord,
  pub receipt: ExecutionReceipt,
}

/// Result of a cancellation: the updated record plus the transaction the
/// owner must sign to close the order upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOutcome {
  pub order: OrderRecord,
  pub cancel: CancelTicket,
}

/// Routes computed legs to the trigger gateway and the order store.
pub struct OrderRouter<G: TriggerGateway, S: OrderStore> {
  engine: OrderCalculationEngine,
  gateway: Arc<G>,
  store: Arc<S>,
  /// Compute and report legs without submitting them.
  dry_run: bool,
}

impl<G: TriggerGateway, S: OrderStore> OrderRouter<G, S> {
  pub fn new(engine: OrderCalculationEngine, gateway: Arc<G>, store: Arc<S>) -> Self {
    Self {
      engine,
      gateway,
      store,
      dry_run: false,
    }
  }

  #[must_use]
  pub fn with_dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  pub const fn engine(&self) -> &OrderCalculationEngine {
    &self.engine
  }

  /// Compute the legs without touching any collaborator.
  pub fn preview(&self, request: &CalculationRequest) -> Result<OrderCalculationSet, CalculationError> {
    self.engine.calculate(request)
  }

  /// Calculate, then submit every leg in order.
  ///
  /// Fails as a whole only when the intent itself is invalid; once
  /// submission starts every leg reports its own outcome.
  #[instrument(skip(self, intent), fields(owner = %intent.owner, input = %intent.input_token))]
  pub async fn place(&self, intent: &TradeIntent) -> Result<PlacementReport> {
    intent.validate_identities()?;
    let calculation = self.engine.calculate(&intent.request)?;

    let legs: Vec<(&CalculatedOrder, LegSubmission)> = calculation
      .orders()
      .into_iter()
      .map(|order| (order, LegSubmission::route(intent, order)))
      .collect();

    let mut results = Vec::with_capacity(legs.len());
    for (order, leg) in legs {
      let outcome = if self.dry_run {
        info!(kind = %order.kind, making = leg.making_amount, "Dry run, leg not submitted");
        LegOutcome::Skipped
      } else {
        match self.submit_leg(intent, order, &leg).await {
          Ok(record) => LegOutcome::Placed {
            record: Box::new(record),
          },
          Err(e) => {
            let error = format!("{e:#}");
            warn!(kind = %order.kind, error = %error, "Leg submission failed");
            LegOutcome::Failed { error }
          }
        }
      };
      results.push(LegResult {
        kind: order.kind,
        outcome,
      });
    }

    let placed = results
      .iter()
      .filter(|r| matches!(r.outcome, LegOutcome::Placed { .. }))
      .count();
    let failed = results
      .iter()
      .filter(|r| matches!(r.outcome, LegOutcome::Failed { .. }))
      .count();

    info!(placed, failed, legs = results.len(), "Placement finished");

    Ok(PlacementReport {
      calculation,
      legs: results,
      placed,
      failed,
      timestamp: Utc::now(),
    })
  }

  async fn submit_leg(
    &self,
    intent: &TradeIntent,
    order: &CalculatedOrder,
    leg: &LegSubmission,
  ) -> Result<OrderRecord> {
    let created = self.gateway.create_order(leg).await?;
    let handle = created.order_handle.clone();

    let record = OrderRecord::new_pending(
      intent,
      order,
      leg,
      created.order_handle,
      created.request_id,
      created.unsigned_transaction,
    )?;

    self
      .store
      .insert(&record)
      .await
      .with_context(|| format!("Order {handle} created upstream but not stored"))?;

    Ok(record)
  }

  async fn pending_record(&self, id: Uuid, next: OrderStatus) -> Result<OrderRecord> {
    let record = self
      .store
      .get(id)
      .await?
      .with_context(|| format!("Order {id} not found"))?;
    anyhow::ensure!(
      record.status.can_transition_to(next),
      "Order {id} is {}, only PENDING orders can move to {next}",
      record.status
    );
    Ok(record)
  }

  /// Forward the owner's signed transaction for a pending order.
  ///
  /// The record stays PENDING: landing the transaction arms the
  /// trigger, it does not fill it.
  #[instrument(skip(self, signed_transaction))]
  pub async fn execute(&self, id: Uuid, signed_transaction: &str) -> Result<ExecutionOutcome> {
    let order = self.pending_record(id, OrderStatus::Executed).await?;
    let receipt = self
      .gateway
      .execute_order(signed_transaction, &order.request_id)
      .await?;
    Ok(ExecutionOutcome { order, receipt })
  }

  /// Request a cancel transaction upstream and mark the order CANCELLED.
  #[instrument(skip(self))]
  pub async fn cancel(&self, id: Uuid) -> Result<CancelOutcome> {
    let record = self.pending_record(id, OrderStatus::Cancelled).await?;
    let cancel = self
      .gateway
      .cancel_order(&record.owner, &record.order_handle)
      .await?;
    let order = self.store.update_status(id, OrderStatus::Cancelled).await?;
    Ok(CancelOutcome { order, cancel })
  }

  #[instrument(skip(self))]
  pub async fn mark_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderRecord> {
    self.store.update_status(id, status).await
  }

  pub async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<OrderRecord>> {
    self.store.list(query).await
  }
}
