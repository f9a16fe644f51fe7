//! Evaluation module - metrics, the workflow grid, and cross-validated
//! model selection

pub mod metrics;
pub mod resample;
pub mod workflow;

pub use metrics::*;
pub use resample::*;
pub use workflow::*;
