//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces. Each use case is a
//! self-contained business operation.
//!
//! Use cases:
//! - `OrderRouter`: preview, placement, execution, cancellation, queries
//! - `AdvisoryPlanner`: quote-driven suggestions run through the engine

pub mod advisory_planner;
pub mod order_router;

pub use advisory_planner::{AdvisoryPlan, AdvisoryPlanner};
pub use order_router::{
  CancelOutcome, ExecutionOutcome, LegOutcome, LegResult, OrderRouter, PlacementReport,
};
