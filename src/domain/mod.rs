//! Domain layer - Core business logic and models.
//!
//! Pure order-calculation logic for the trigger order router.
//! No I/O here (hexagonal architecture inner ring).
//! All types are serializable and testable in isolation.

pub mod calculation;
pub mod error;
pub mod order;
pub mod routing;
pub mod scaling;

// Re-export core types for convenience
pub use calculation::{
    CalculatedOrder, CalculationRequest, CalculationSummary, OrderCalculationEngine,
    OrderCalculationSet, OrderKind,
};
pub use error::CalculationError;
pub use order::{OrderMetadata, OrderRecord, OrderStatus, OrderType};
pub use routing::{LegSubmission, OwnerId, TokenId, TradeIntent};
pub use scaling::{from_scaled_amount, to_scaled_amount};
