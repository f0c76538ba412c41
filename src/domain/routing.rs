//! Leg routing: token direction for each computed order.
//!
//! The engine only knows amounts. A [`TradeIntent`] adds the token pair and
//! owner, and [`LegSubmission::route`] pairs each computed leg with the
//! token direction it trades in. Exit legs swap input and output tokens
//! exactly as the engine swaps their decimal precisions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calculation::{CalculatedOrder, CalculationRequest, OrderCalculationSet, OrderKind};
use super::scaling::amount_text;

/// Token mint / contract identifier, opaque to the engine.
pub type TokenId = String;

/// Wallet identity that makes and pays for the orders.
pub type OwnerId = String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("input_token and output_token must differ, both are {token}")]
    SameToken { token: TokenId },
}

/// Inbound trade intent: calculation inputs plus the identities carried
/// through to every leg unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeIntent {
    #[serde(flatten)]
    pub request: CalculationRequest,
    /// Token the entry leg sells.
    pub input_token: TokenId,
    /// Token the entry leg buys.
    pub output_token: TokenId,
    #[serde(alias = "ownerIdentity")]
    pub owner: OwnerId,
}

impl TradeIntent {
    /// Check the identity fields the engine does not look at.
    ///
    /// # Errors
    /// Empty identities, or an input token equal to the output token.
    pub fn validate_identities(&self) -> Result<(), RoutingError> {
        for (field, value) in [
            ("input_token", &self.input_token),
            ("output_token", &self.output_token),
            ("owner", &self.owner),
        ] {
            if value.trim().is_empty() {
                return Err(RoutingError::EmptyField { field });
            }
        }
        if self.input_token == self.output_token {
            return Err(RoutingError::SameToken {
                token: self.input_token.clone(),
            });
        }
        Ok(())
    }

    /// Route every present leg of `set`, in submission order.
    pub fn legs(&self, set: &OrderCalculationSet) -> Vec<LegSubmission> {
        set.orders()
            .into_iter()
            .map(|order| LegSubmission::route(self, order))
            .collect()
    }
}

/// A fully formed order ready for the trigger gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegSubmission {
    pub kind: OrderKind,
    pub input_token: TokenId,
    pub output_token: TokenId,
    pub owner: OwnerId,
    #[serde(with = "amount_text")]
    pub making_amount: u128,
    #[serde(with = "amount_text")]
    pub taking_amount: u128,
    /// Precision of `input_token`, i.e. of `making_amount`.
    pub input_decimals: u32,
    /// Precision of `output_token`, i.e. of `taking_amount`.
    pub output_decimals: u32,
}

impl LegSubmission {
    /// Pair a computed leg with its token direction.
    pub fn route(intent: &TradeIntent, order: &CalculatedOrder) -> Self {
        let request = &intent.request;
        let (input_token, output_token, input_decimals, output_decimals) = if order.kind.is_exit()
        {
            (
                intent.output_token.clone(),
                intent.input_token.clone(),
                request.output_decimals,
                request.input_decimals,
            )
        } else {
            (
                intent.input_token.clone(),
                intent.output_token.clone(),
                request.input_decimals,
                request.output_decimals,
            )
        };

        Self {
            kind: order.kind,
            input_token,
            output_token,
            owner: intent.owner.clone(),
            making_amount: order.making_amount,
            taking_amount: order.taking_amount,
            input_decimals,
            output_decimals,
        }
    }
}
