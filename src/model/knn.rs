//! K-nearest-neighbor classification over Euclidean distance
//!
//! Fitting stores the training matrix; prediction scans it per query row
//! with a bounded max-heap, parallelized across query rows with rayon.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::model::error::{ModelError, ModelResult};

/// A fitted k-nearest-neighbor classifier for 0/1 labels
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    n_neighbors: usize,
    x_train: Array2<f64>,
    y_train: Vec<i32>,
}

impl KnnClassifier {
    /// Store the training data after validating the neighbor count
    pub fn fit(n_neighbors: usize, x: &Array2<f64>, y: &[i32]) -> ModelResult<Self> {
        let n = x.nrows();
        if n == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyTraining);
        }
        if n != y.len() {
            return Err(ModelError::ShapeMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n_neighbors == 0 || n_neighbors > n {
            return Err(ModelError::InvalidNeighbors {
                k: n_neighbors,
                n_train: n,
            });
        }
        Ok(Self {
            n_neighbors,
            x_train: x.clone(),
            y_train: y.to_vec(),
        })
    }

    /// Positive-class probability per row: the fraction of positive labels
    /// among the k nearest training rows
    pub fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array1<f64>> {
        if x.ncols() != self.x_train.ncols() {
            return Err(ModelError::ShapeMismatch {
                expected: self.x_train.ncols(),
                actual: x.ncols(),
            });
        }

        let probabilities: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = self.nearest_labels(x.row(i));
                let positives = neighbors.iter().filter(|&&label| label == 1).count();
                positives as f64 / neighbors.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(probabilities))
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Labels of the k training rows closest to the query
    fn nearest_labels(&self, query: ArrayView1<f64>) -> Vec<i32> {
        let mut heap = BinaryHeap::with_capacity(self.n_neighbors + 1);

        for (idx, row) in self.x_train.rows().into_iter().enumerate() {
            let dist = euclidean_distance(query, row);
            if heap.len() < self.n_neighbors {
                heap.push(DistLabel(dist, self.y_train[idx]));
            } else if let Some(top) = heap.peek() {
                if dist < top.0 {
                    heap.pop();
                    heap.push(DistLabel(dist, self.y_train[idx]));
                }
            }
        }

        heap.into_iter().map(|entry| entry.1).collect()
    }
}

/// Max-heap entry keeping the k smallest distances
#[derive(PartialEq)]
struct DistLabel(f64, i32);

impl Eq for DistLabel {}
impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
