//! Lifeboat: Survival Model Selection Library
//!
//! A library for comparing imputation, encoding, and classifier workflows
//! on passenger survival data using repeated stratified cross-validation.

pub mod cli;
pub mod eval;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;
