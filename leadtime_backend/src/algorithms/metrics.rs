use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{PipelineError, PipelineResult, Stage};

/// Regression quality of a prediction against the observed target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub mae: f64,
    pub median_ae: f64,
    pub r2: f64,
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MSE={:.4} MAE={:.4} MedianAE={:.4} R2={:.4}",
            self.mse, self.mae, self.median_ae, self.r2
        )
    }
}

/// Compute MSE, MAE, median absolute error and R² of `y_pred` against `y_true`.
///
/// When the target is constant, R² is 1 for a perfect prediction and 0
/// otherwise.
///
/// # Arguments
/// * `y_pred` - Predicted lead times
/// * `y_true` - Observed lead times, same length
pub fn evaluate(y_pred: &[f64], y_true: &[f64]) -> PipelineResult<RegressionMetrics> {
    if y_pred.len() != y_true.len() {
        return Err(PipelineError::alignment(
            Stage::Evaluation,
            format!(
                "{} predictions for {} observations",
                y_pred.len(),
                y_true.len()
            ),
        ));
    }
    if y_true.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: Stage::Evaluation,
            column: "y_true".to_string(),
        });
    }

    let residuals: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();
    let squared = Float64Chunked::from_vec(
        "squared_error".into(),
        residuals.iter().map(|r| r * r).collect(),
    );
    let absolute = Float64Chunked::from_vec(
        "absolute_error".into(),
        residuals.iter().map(|r| r.abs()).collect(),
    );
    let observed = Float64Chunked::from_slice("y_true".into(), y_true);

    let mse = squared.mean().unwrap_or(0.0);
    let mae = absolute.mean().unwrap_or(0.0);
    let median_ae = absolute.median().unwrap_or(0.0);

    let mean_true = observed.mean().unwrap_or(0.0);
    let ss_res = squared.sum().unwrap_or(0.0);
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    let metrics = RegressionMetrics {
        mse,
        mae,
        median_ae,
        r2,
    };
    log::info!("Evaluation over {} rows: {}", y_true.len(), metrics);
    Ok(metrics)
}
