//! Regression evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// Coefficient of determination.
///
/// A constant target has no variance to explain, so `ss_tot == 0` maps to
/// `0.0` rather than dividing by zero.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.is_empty() {
        return Err(ScorecastError::Data(
            "cannot score an empty target vector".to_string(),
        ));
    }
    if y_true.len() != y_pred.len() {
        return Err(ScorecastError::ShapeMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }

    let n = y_true.len() as f64;
    let y_mean: f64 = y_true.iter().sum::<f64>() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        Ok(1.0 - ss_res / ss_tot)
    } else {
        Ok(0.0)
    }
}

/// Held-out evaluation summary for a fitted regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        let r2 = r2_score(y_true, y_pred)?;

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}
