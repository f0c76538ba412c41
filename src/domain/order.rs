//! Persisted order records.
//!
//! One record per submitted leg. The engine's output reaches storage only
//! through [`OrderRecord::new_pending`]; everything after that (status
//! transitions, queries) belongs to the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::calculation::{CalculatedOrder, OrderKind};
use super::error::CalculationError;
use super::routing::{LegSubmission, OwnerId, TokenId, TradeIntent};
use super::scaling::{self, amount_text};

/// Persisted name for the leg kind.
pub type OrderType = OrderKind;

/// Lifecycle of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created upstream, awaiting trigger.
    Pending,
    /// Filled by the upstream trigger service.
    Executed,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Only PENDING moves, and only to a terminal state.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Executed => write!(f, "EXECUTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order {id} cannot move from {from} to {to}")]
pub struct StatusTransitionError {
    pub id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Versioned, structured metadata stored alongside each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum OrderMetadata {
    V1(LegMetadataV1),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegMetadataV1 {
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub expected_output_amount: Decimal,
    #[serde(with = "amount_text")]
    pub making_amount: u128,
    #[serde(with = "amount_text")]
    pub taking_amount: u128,
    /// Unsigned transaction returned by the gateway, for the owner to sign.
    pub unsigned_transaction: String,
    pub description: String,
}

/// A submitted leg as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub owner: OwnerId,
    /// Upstream order account / handle.
    pub order_handle: String,
    /// Upstream request id, required to execute the signed transaction.
    pub request_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub input_token: TokenId,
    pub output_token: TokenId,
    /// Human-scale `making_amount` at the leg's input precision.
    pub input_amount: Decimal,
    /// Human-scale `taking_amount` at the leg's output precision.
    pub output_amount: Decimal,
    pub entry_price: Decimal,
    pub take_profit_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub metadata: OrderMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Build the PENDING record for a leg the gateway accepted.
    ///
    /// # Errors
    /// Fails only if the leg's scaled amounts cannot be represented as
    /// decimals, which the engine's bounds already rule out.
    pub fn new_pending(
        intent: &TradeIntent,
        order: &CalculatedOrder,
        leg: &LegSubmission,
        order_handle: String,
        request_id: String,
        unsigned_transaction: String,
    ) -> Result<Self, CalculationError> {
        let now = Utc::now();
        let request = &intent.request;

        Ok(Self {
            id: Uuid::new_v4(),
            owner: leg.owner.clone(),
            order_handle,
            request_id,
            order_type: order.kind,
            status: OrderStatus::Pending,
            input_token: leg.input_token.clone(),
            output_token: leg.output_token.clone(),
            input_amount: scaling::from_scaled_units(leg.making_amount, leg.input_decimals)?,
            output_amount: scaling::from_scaled_units(leg.taking_amount, leg.output_decimals)?,
            entry_price: request.buy_price,
            take_profit_price: request.take_profit_price,
            stop_loss_price: request.stop_loss_price,
            metadata: OrderMetadata::V1(LegMetadataV1 {
                current_price: request.current_price,
                target_price: order.target_price,
                expected_output_amount: order.expected_output_amount,
                making_amount: order.making_amount,
                taking_amount: order.taking_amount,
                unsigned_transaction,
                description: order.description.clone(),
            }),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a status transition, refusing to leave a terminal state.
    ///
    /// # Errors
    /// [`StatusTransitionError`] when the lifecycle forbids the move.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), StatusTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusTransitionError {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
