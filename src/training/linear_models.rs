//! Standardised ordinary least squares

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Cholesky solve of the symmetric system `a x = b`.
/// Returns `None` when `a` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                // relative tolerance catches exactly collinear columns lost to rounding
                if diag <= 1e-10 * a[[i, i]].abs() || diag <= 0.0 {
                    return None;
                }
                l[[i, i]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting on `[a | b]`
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| aug[[r1, col]].abs().total_cmp(&aug[[r2, col]].abs()))?;
        if aug[[pivot_row, col]].abs() < 1e-10 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);
        let pivot_values = aug.row(col).to_owned();
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                aug.row_mut(row).scaled_add(-factor, &pivot_values);
            }
        }
    }
    Some(aug.column(n).to_owned())
}

/// Solve the normal equations `(X^T X) w = X^T y`.
///
/// Tries Cholesky, then Cholesky with a small ridge on the diagonal (for
/// collinear or constant columns), then Gauss-Jordan.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    let n = xtx.nrows();
    let mean_diag = xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let ridge = (1e-8 * mean_diag).max(1e-12);
    let mut regularized = xtx.clone();
    regularized.diag_mut().mapv_inplace(|v| v + ridge);
    if let Some(w) = cholesky_solve(&regularized, &xty) {
        return Some(w);
    }

    gauss_jordan_solve(&xtx, &xty)
}

/// Linear regression fitted on standardised features.
///
/// Each feature is centred and divided by its population standard deviation
/// (1 for constant features) before solving. Because the standardised matrix
/// has zero column means, the intercept is the target mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledLinearModel {
    feature_names: Vec<String>,
    means: Array1<f64>,
    scales: Array1<f64>,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl ScaledLinearModel {
    /// Fit on a row-major feature matrix whose columns are `feature_names`
    pub fn fit(feature_names: Vec<String>, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(PipelineError::invalid_parameter(
                "x_train",
                format!("{}x{}", n_samples, n_features),
                "training data must have at least one row and one feature",
            ));
        }
        if feature_names.len() != n_features {
            return Err(PipelineError::ShapeError {
                expected: format!("{} feature names", n_features),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        if y.len() != n_samples {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::ComputationError("empty feature matrix".to_string()))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        let standardized = (x - &means.view().insert_axis(Axis(0))) / &scales.view().insert_axis(Axis(0));

        let y_mean = y.mean().unwrap_or(0.0);
        let y_centered = y - y_mean;

        let coefficients = solve_least_squares(&standardized, &y_centered).ok_or_else(|| {
            PipelineError::ComputationError("normal equations are singular".to_string())
        })?;

        Ok(Self {
            feature_names,
            means,
            scales,
            coefficients,
            intercept: y_mean,
        })
    }

    /// Predict from a matrix with the training column layout
    pub fn predict_array(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} columns", self.coefficients.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let standardized =
            (x - &self.means.view().insert_axis(Axis(0))) / &self.scales.view().insert_axis(Axis(0));
        Ok(standardized.dot(&self.coefficients) + self.intercept)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Coefficients on the standardised scale
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}
