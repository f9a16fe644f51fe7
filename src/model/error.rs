//! Error types for model fitting and prediction

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Failure modes of classifier fitting and prediction
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Training data is empty")]
    EmptyTraining,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Normal equations are singular and cannot be solved")]
    Singular,

    #[error("Invalid neighbor count {k} for {n_train} training rows")]
    InvalidNeighbors { k: usize, n_train: usize },
}
