//! Linear regressors: ordinary least squares, ridge, and lasso.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// Solve the symmetric positive-definite system `A x = b` by Cholesky
/// decomposition. Returns `None` when `A` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::zeros((n, n));
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

    // Forward substitution: L y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting, tolerant of rank
/// deficiency. One-hot groups make `X^T X` exactly singular after centering,
/// but normal equations stay consistent, so a negligible pivot marks a free
/// coordinate: it is pinned at zero and elimination moves on. Returns `None`
/// only for inconsistent systems.
fn gaussian_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let scale = a.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
    let tol = scale * 1e-12;

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    let mut pivot_row_of: Vec<Option<usize>> = vec![None; n];
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }
        let mut max_row = row;
        for r in row + 1..n {
            if aug[[r, col]].abs() > aug[[max_row, col]].abs() {
                max_row = r;
            }
        }
        if aug[[max_row, col]].abs() < tol {
            continue;
        }
        if max_row != row {
            for j in 0..=n {
                let tmp = aug[[row, j]];
                aug[[row, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        let pivot = aug[[row, col]];
        for j in 0..=n {
            aug[[row, j]] /= pivot;
        }
        for r in 0..n {
            if r != row {
                let factor = aug[[r, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[r, j]] -= factor * aug[[row, j]];
                    }
                }
            }
        }

        pivot_row_of[col] = Some(row);
        row += 1;
    }

    // Leftover zero rows must have zero right-hand sides.
    for r in row..n {
        if aug[[r, n]].abs() > tol {
            return None;
        }
    }

    let mut x = Array1::zeros(n);
    for col in 0..n {
        if let Some(r) = pivot_row_of[col] {
            x[col] = aug[[r, n]];
        }
    }
    Some(x)
}

/// Solve the (optionally ridge-regularized) normal equations
/// `(X^T X + alpha I) w = X^T y`, Cholesky first and rank-tolerant
/// elimination second.
fn solve_normal_equations(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
) -> Result<Array1<f64>> {
    let mut xtx = x.t().dot(x);
    if alpha > 0.0 {
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += alpha;
        }
    }
    let xty = x.t().dot(y);

    if let Some(solution) = cholesky_solve(&xtx, &xty) {
        return Ok(solution);
    }
    gaussian_solve(&xtx, &xty).ok_or_else(|| {
        ScorecastError::Data("normal equations are inconsistent, cannot fit".to_string())
    })
}

fn center(x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>, Array1<f64>, f64) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);
    let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
    let y_centered = y - y_mean;
    (x_centered, y_centered, x_mean, y_mean)
}

fn check_training_shape(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ScorecastError::ShapeMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(ScorecastError::Data(
            "cannot fit on an empty feature matrix".to_string(),
        ));
    }
    Ok(())
}

fn linear_predict(
    x: &Array2<f64>,
    coefficients: &Option<Array1<f64>>,
    intercept: f64,
) -> Result<Array1<f64>> {
    let coefficients = coefficients.as_ref().ok_or(ScorecastError::NotFitted)?;
    if x.ncols() != coefficients.len() {
        return Err(ScorecastError::ShapeMismatch {
            expected: coefficients.len(),
            actual: x.ncols(),
        });
    }
    Ok(x.dot(coefficients) + intercept)
}

/// Ordinary least squares with an intercept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_shape(x, y)?;

        let (x_centered, y_centered, x_mean, y_mean) = center(x, y);
        let coefficients = solve_normal_equations(&x_centered, &y_centered, 0.0)?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(x, &self.coefficients, self.intercept)
    }
}

/// L2-regularized least squares. The penalty keeps the system positive
/// definite even with perfectly collinear indicator columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.alpha < 0.0 {
            return Err(ScorecastError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        check_training_shape(x, y)?;

        let (x_centered, y_centered, x_mean, y_mean) = center(x, y);
        let coefficients = solve_normal_equations(&x_centered, &y_centered, self.alpha)?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(x, &self.coefficients, self.intercept)
    }
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

/// L1-regularized least squares fitted by cyclic coordinate descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 1000,
            tol: 1e-6,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.alpha < 0.0 {
            return Err(ScorecastError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        check_training_shape(x, y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let (x_centered, y_centered, x_mean, y_mean) = center(x, y);

        let col_norms: Vec<f64> = (0..n_features)
            .map(|j| x_centered.column(j).mapv(|v| v * v).sum())
            .collect();

        // Penalty on the same scale as the unnormalized squared loss.
        let lambda = self.alpha * n_samples as f64;

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut residual = y_centered.clone();

        for _ in 0..self.max_iter {
            let mut max_delta: f64 = 0.0;

            for j in 0..n_features {
                if col_norms[j] <= 0.0 {
                    continue;
                }

                let x_j = x_centered.column(j);
                let old = weights[j];
                let rho = x_j.dot(&residual) + old * col_norms[j];
                let new = soft_threshold(rho, lambda) / col_norms[j];

                let delta = new - old;
                if delta != 0.0 {
                    residual.scaled_add(-delta, &x_j);
                    weights[j] = new;
                }
                max_delta = max_delta.max(delta.abs());
            }

            if max_delta < self.tol {
                break;
            }
        }

        self.intercept = y_mean - weights.dot(&x_mean);
        self.coefficients = Some(weights);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(x, &self.coefficients, self.intercept)
    }
}
