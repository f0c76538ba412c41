//! Upstream HTTP Adapters
//!
//! Sub-modules:
//! - `client`: HTTP client with concurrency limit and retries
//! - `price`: `PriceLookup` over the price API
//! - `trigger`: `TriggerGateway` over the trigger-order API
//! - `types`: API request/response type definitions

pub mod client;
pub mod price;
pub mod trigger;
pub mod types;
