//! WebSocket wire messages.
//!
//! Every inbound frame is `{ "id": ..., "event": "<name>", "data": {...} }`.
//! Replies echo `id` and carry either `"<name>_result"` or `"error"`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::calculation::{
    CalculationRequest, DEFAULT_INPUT_DECIMALS, DEFAULT_OUTPUT_DECIMALS,
};
use crate::domain::order::OrderStatus;
use crate::domain::routing::{OwnerId, TokenId, TradeIntent};
use crate::ports::order_store::{DEFAULT_LIST_LIMIT, OrderQuery};

/// Upper bound on `get_orders` page size.
pub const MAX_LIST_LIMIT: usize = 500;

/// Raw inbound envelope, decoded before the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<String>,
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOrderParams {
    pub order_id: Uuid,
    pub signed_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdParams {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusParams {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrdersParams {
    #[serde(default, alias = "ownerIdentity")]
    pub owner: Option<OwnerId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl GetOrdersParams {
    pub fn into_query(self) -> OrderQuery {
        OrderQuery {
            owner: self.owner,
            status: self.status,
            limit: self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPriceParams {
    pub token: TokenId,
}

const fn default_input_decimals() -> u32 {
    DEFAULT_INPUT_DECIMALS
}

const fn default_output_decimals() -> u32 {
    DEFAULT_OUTPUT_DECIMALS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestOrdersParams {
    pub token: TokenId,
    /// Amount of the input token available to sell.
    pub budget: Decimal,
    #[serde(default = "default_input_decimals")]
    pub input_decimals: u32,
    #[serde(default = "default_output_decimals")]
    pub output_decimals: u32,
}

/// A decoded inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    CalculateOrders(CalculationRequest),
    CreateOrders(TradeIntent),
    ExecuteOrder(ExecuteOrderParams),
    CancelOrder(OrderIdParams),
    UpdateStatus(UpdateStatusParams),
    GetOrders(GetOrdersParams),
    GetPrice(GetPriceParams),
    SuggestOrders(SuggestOrdersParams),
}

impl ClientRequest {
    /// Event names accepted on the wire.
    pub const EVENTS: [&'static str; 8] = [
        "calculate_orders",
        "create_orders",
        "execute_order",
        "cancel_order",
        "update_status",
        "get_orders",
        "get_price",
        "suggest_orders",
    ];

    /// Decode the payload for a known event.
    ///
    /// # Errors
    /// Unknown event names and payloads that do not match the event.
    pub fn decode(event: &str, data: serde_json::Value) -> Result<Self, String> {
        fn parse<T: serde::de::DeserializeOwned>(
            event: &str,
            data: serde_json::Value,
        ) -> Result<T, String> {
            serde_json::from_value(data).map_err(|e| format!("invalid {event} payload: {e}"))
        }

        let data = if data.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            data
        };

        Ok(match event {
            "calculate_orders" => Self::CalculateOrders(parse(event, data)?),
            "create_orders" => Self::CreateOrders(parse(event, data)?),
            "execute_order" => Self::ExecuteOrder(parse(event, data)?),
            "cancel_order" => Self::CancelOrder(parse(event, data)?),
            "update_status" => Self::UpdateStatus(parse(event, data)?),
            "get_orders" => Self::GetOrders(parse(event, data)?),
            "get_price" => Self::GetPrice(parse(event, data)?),
            "suggest_orders" => Self::SuggestOrders(parse(event, data)?),
            other => return Err(format!("unknown event: {other}")),
        })
    }

    pub const fn event(&self) -> &'static str {
        match self {
            Self::CalculateOrders(_) => "calculate_orders",
            Self::CreateOrders(_) => "create_orders",
            Self::ExecuteOrder(_) => "execute_order",
            Self::CancelOrder(_) => "cancel_order",
            Self::UpdateStatus(_) => "update_status",
            Self::GetOrders(_) => "get_orders",
            Self::GetPrice(_) => "get_price",
            Self::SuggestOrders(_) => "suggest_orders",
        }
    }
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    /// The underlying error message, unaltered.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Outbound reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub id: Option<String>,
    pub event: String,
    pub data: serde_json::Value,
}

impl ServerMessage {
    pub fn result<T: Serialize>(id: Option<String>, event: &str, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                id,
                event: format!("{event}_result"),
                data,
            },
            Err(e) => Self::error(id, "INTERNAL", e.to_string(), None),
        }
    }

    pub fn error(id: Option<String>, code: &str, message: String, field: Option<&str>) -> Self {
        let body = ErrorBody {
            code: code.to_string(),
            message,
            field: field.map(str::to_string),
        };
        Self {
            id,
            event: "error".to_string(),
            data: serde_json::to_value(&body).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn is_error(&self) -> bool {
        self.event == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decode_calculate_orders_with_defaults() {
        let req = ClientRequest::decode(
            "calculate_orders",
            json!({"currentPrice": "100", "buyPrice": "95", "amountToSell": "1", "takeProfitPrice": "110"}),
        )
        .unwrap();
        let ClientRequest::CalculateOrders(request) = req else {
            panic!("wrong variant");
        };
        assert_eq!(request.buy_price, dec!(95));
        assert_eq!(request.take_profit_price, Some(dec!(110)));
        assert_eq!(request.input_decimals, 9);
        assert_eq!(request.output_decimals, 6);
    }

    #[test]
    fn test_decode_create_orders_with_owner_alias() {
        let req = ClientRequest::decode(
            "create_orders",
            json!({
                "currentPrice": "100", "buyPrice": "95", "amountToSell": "1",
                "inputToken": "SOL", "outputToken": "USDC", "ownerIdentity": "wallet"
            }),
        )
        .unwrap();
        let ClientRequest::CreateOrders(intent) = req else {
            panic!("wrong variant");
        };
        assert_eq!(intent.owner, "wallet");
        assert_eq!(intent.request.amount_to_sell, dec!(1));
    }

    #[test]
    fn test_unknown_event_and_bad_payload() {
        assert_eq!(
            ClientRequest::decode("explode", json!({})).unwrap_err(),
            "unknown event: explode"
        );
        let err = ClientRequest::decode("cancel_order", json!({"orderId": "nope"})).unwrap_err();
        assert!(err.starts_with("invalid cancel_order payload"));
    }

    #[test]
    fn test_get_orders_limit_is_clamped() {
        let ClientRequest::GetOrders(params) =
            ClientRequest::decode("get_orders", serde_json::Value::Null).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(params.clone().into_query().limit, DEFAULT_LIST_LIMIT);

        let big = GetOrdersParams {
            limit: Some(10_000),
            ..params
        };
        assert_eq!(big.into_query().limit, MAX_LIST_LIMIT);
    }

    #[test]
    fn test_reply_shapes() {
        let ok = ServerMessage::result(Some("7".to_string()), "get_price", &json!({"price": "1"}));
        assert_eq!(ok.event, "get_price_result");
        assert_eq!(ok.id.as_deref(), Some("7"));

        let err = ServerMessage::error(None, "INVALID_AMOUNT", "bad".to_string(), Some("buy_price"));
        assert!(err.is_error());
        assert_eq!(err.data["field"], "buy_price");
        assert_eq!(err.data["message"], "bad");
    }
}
