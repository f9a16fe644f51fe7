//! Binary logistic regression fit by iteratively reweighted least squares
//!
//! Each iteration solves the weighted normal equations with a Cholesky
//! decomposition, falling back to Gauss-Jordan inversion when the system
//! is not positive definite.

use ndarray::{s, Array1, Array2};

use crate::model::error::{ModelError, ModelResult};

/// Iteration cap of the reweighting loop
const MAX_ITERATIONS: usize = 25;

/// Convergence bound on the largest coefficient update
const CONVERGENCE_TOLERANCE: f64 = 1e-8;

/// Clip on the linear predictor, keeps the sigmoid away from exact 0 and 1
const LINEAR_PREDICTOR_LIMIT: f64 = 30.0;

/// Floor of the per-row working weight
const WEIGHT_FLOOR: f64 = 1e-10;

/// A fitted binary logistic regression model
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coefficients: Array1<f64>,
    intercept: f64,
    n_features: usize,
    converged: bool,
    iterations: usize,
}

impl LogisticRegression {
    /// Fit on a feature matrix and 0/1 labels
    pub fn fit(x: &Array2<f64>, y: &[i32]) -> ModelResult<Self> {
        let n = x.nrows();
        let p = x.ncols();
        if n == 0 || p == 0 {
            return Err(ModelError::EmptyTraining);
        }
        if n != y.len() {
            return Err(ModelError::ShapeMismatch {
                expected: n,
                actual: y.len(),
            });
        }

        // Design matrix with a leading intercept column
        let mut design = Array2::zeros((n, p + 1));
        for i in 0..n {
            design[[i, 0]] = 1.0;
            for j in 0..p {
                design[[i, j + 1]] = x[[i, j]];
            }
        }
        let targets: Vec<f64> = y.iter().map(|&v| v as f64).collect();

        let mut beta: Array1<f64> = Array1::zeros(p + 1);
        let mut converged = false;
        let mut iterations = 0;

        for _ in 0..MAX_ITERATIONS {
            iterations += 1;

            let eta: Vec<f64> = design
                .rows()
                .into_iter()
                .map(|row| clip(row.dot(&beta)))
                .collect();

            let mut weights = vec![0.0; n];
            let mut working = vec![0.0; n];
            for i in 0..n {
                let mu = sigmoid(eta[i]);
                let w = (mu * (1.0 - mu)).max(WEIGHT_FLOOR);
                weights[i] = w;
                working[i] = eta[i] + (targets[i] - mu) / w;
            }

            let next = solve_weighted_least_squares(&design, &weights, &working)?;
            let max_update = beta
                .iter()
                .zip(next.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0f64, f64::max);
            beta = next;

            if max_update < CONVERGENCE_TOLERANCE {
                converged = true;
                break;
            }
        }

        Ok(Self {
            intercept: beta[0],
            coefficients: beta.slice(s![1..]).to_owned(),
            n_features: p,
            converged,
            iterations,
        })
    }

    /// Probability of the positive class per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        let probabilities: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| sigmoid(clip(row.dot(&self.coefficients) + self.intercept)))
            .collect();
        Ok(Array1::from_vec(probabilities))
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn clip(eta: f64) -> f64 {
    eta.clamp(-LINEAR_PREDICTOR_LIMIT, LINEAR_PREDICTOR_LIMIT)
}

/// One reweighted least squares step: solve (X^T W X) b = X^T W z
fn solve_weighted_least_squares(
    design: &Array2<f64>,
    weights: &[f64],
    targets: &[f64],
) -> ModelResult<Array1<f64>> {
    let n = design.nrows();
    let p = design.ncols();

    let mut normal: Array2<f64> = Array2::zeros((p, p));
    let mut moment: Array1<f64> = Array1::zeros(p);
    for i in 0..n {
        let w = weights[i];
        for a in 0..p {
            let xa = design[[i, a]];
            moment[a] += w * xa * targets[i];
            for b in a..p {
                normal[[a, b]] += w * xa * design[[i, b]];
            }
        }
    }
    for a in 0..p {
        for b in 0..a {
            normal[[a, b]] = normal[[b, a]];
        }
    }

    if let Some(solution) = cholesky_solve(&normal, &moment) {
        return Ok(solution);
    }
    match matrix_inverse(&normal) {
        Some(inverse) => Ok(inverse.dot(&moment)),
        None => Err(ModelError::Singular),
    }
}

/// Solve a symmetric positive-definite system, with one ridge retry for
/// systems that are only semi-definite
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let factor = match cholesky_factor(a) {
        Some(l) => l,
        None => {
            let n = a.nrows();
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
            let mut regularized = a.clone();
            for i in 0..n {
                regularized[[i, i]] += ridge;
            }
            cholesky_factor(&regularized)?
        }
    };
    Some(substitute(&factor, b))
}

/// Lower-triangular factor L with A = L L^T, or None when A is not
/// positive definite
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l: Array2<f64> = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Forward then backward substitution through the Cholesky factor
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut y: Array1<f64> = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }
    let mut x: Array1<f64> = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    x
}

/// Gauss-Jordan inversion with partial pivoting, the fallback for
/// systems the Cholesky path rejects
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug: Array2<f64> = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..2 * n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv: Array2<f64> = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}
