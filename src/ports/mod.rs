//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `PriceLookup`: Current market price and confidence for a token
//! - `TriggerGateway`: Upstream trigger-order API (create/execute/cancel)
//! - `OrderStore`: Order record persistence and queries
//! - `AdvisoryService`: Optional entry/exit suggestion strategy

pub mod advisory;
pub mod order_store;
pub mod price_lookup;
pub mod trigger_gateway;
