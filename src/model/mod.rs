//! Model module - classifier declarations and their fitted forms

pub mod error;
pub mod knn;
pub mod logistic;

pub use error::{ModelError, ModelResult};
pub use knn::KnnClassifier;
pub use logistic::LogisticRegression;

use ndarray::{Array1, Array2};
use serde::Serialize;

/// Declaration of one classifier in the candidate grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    /// Logistic regression with an intercept
    Logistic,
    /// K-nearest neighbors with the given neighbor count
    Knn { k: usize },
}

impl ModelSpec {
    /// Short identifier used in workflow ids and reports
    pub fn name(&self) -> String {
        match self {
            ModelSpec::Logistic => "logreg".to_string(),
            ModelSpec::Knn { k } => format!("knn{}", k),
        }
    }

    /// Fit this model on the given feature matrix and labels
    pub fn fit(&self, x: &Array2<f64>, y: &[i32]) -> ModelResult<FittedModel> {
        match self {
            ModelSpec::Logistic => Ok(FittedModel::Logistic(LogisticRegression::fit(x, y)?)),
            ModelSpec::Knn { k } => Ok(FittedModel::Knn(KnnClassifier::fit(*k, x, y)?)),
        }
    }
}

/// A fitted classifier, ready to score new rows
#[derive(Debug, Clone)]
pub enum FittedModel {
    Logistic(LogisticRegression),
    Knn(KnnClassifier),
}

impl FittedModel {
    /// Positive-class probability per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array1<f64>> {
        match self {
            FittedModel::Logistic(model) => model.predict_proba(x),
            FittedModel::Knn(model) => model.predict_proba(x),
        }
    }
}
