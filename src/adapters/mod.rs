//! Adapters layer - Concrete implementations of port traits.
//!
//! Connects the router to the outside world:
//! - `api`: trigger-order and price HTTP APIs
//! - `advisory`: built-in suggestion strategy
//! - `metrics`: Prometheus, health checks
//! - `persistence`: JSON order store
//! - `transport`: WebSocket request server

pub mod advisory;
pub mod api;
pub mod metrics;
pub mod persistence;
pub mod transport;
