//! Persistence Adapters - JSON File Storage
//!
//! Implements the `OrderStore` port with an in-memory index mirrored
//! to an atomic JSON snapshot. No database dependency.

pub mod order_store;

pub use order_store::JsonOrderStore;
