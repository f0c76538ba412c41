//! Advisory strategies implementing the `AdvisoryService` port.

pub mod band;

pub use band::BandAdvisor;
