use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::domain::columns::LEAD_TIME;
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;

/// Interquartile fence `[Q1 - k*IQR, Q3 + k*IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFence {
    /// Compute the fence from the non-null values of `values`.
    ///
    /// Quartiles use linear interpolation between order statistics. Fails with
    /// an empty-input error when no non-null value exists.
    pub fn from_values(
        values: &Float64Chunked,
        fence_multiplier: f64,
        column: &str,
    ) -> PipelineResult<Self> {
        let empty = || PipelineError::EmptyInput {
            stage: Stage::OutlierFilter,
            column: column.to_string(),
        };

        let q1 = values
            .quantile(0.25, QuantileMethod::Linear)
            .at_stage(Stage::OutlierFilter)?
            .ok_or_else(empty)?;
        let q3 = values
            .quantile(0.75, QuantileMethod::Linear)
            .at_stage(Stage::OutlierFilter)?
            .ok_or_else(empty)?;

        let iqr = q3 - q1;
        Ok(Self {
            q1,
            q3,
            iqr,
            lower: q1 - fence_multiplier * iqr,
            upper: q3 + fence_multiplier * iqr,
        })
    }

    /// Inclusive bounds check.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Outcome of one outlier filter pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub fence: IqrFence,
    pub rows_in: usize,
    pub rows_kept: usize,
}

impl OutlierReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_in - self.rows_kept
    }
}

/// Drops rows whose value falls outside the IQR fence of one numeric column.
///
/// Null values fail the fence test and are dropped. When every non-null value
/// is identical the fence collapses to that value.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    column: String,
    fence_multiplier: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            column: LEAD_TIME.to_string(),
            fence_multiplier: 1.5,
        }
    }
}

impl OutlierFilter {
    pub fn new(column: impl Into<String>, fence_multiplier: f64) -> Self {
        Self {
            column: column.into(),
            fence_multiplier,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Compute the fence for `df` without filtering.
    pub fn fence(&self, df: &DataFrame) -> PipelineResult<IqrFence> {
        let values = self.values(df)?;
        let values = values.f64().at_stage(Stage::OutlierFilter)?;
        IqrFence::from_values(values, self.fence_multiplier, &self.column)
    }

    /// Filter `df`, returning the kept rows and a report of the pass.
    pub fn apply(&self, df: &DataFrame) -> PipelineResult<(DataFrame, OutlierReport)> {
        let values = self.values(df)?;
        let values = values.f64().at_stage(Stage::OutlierFilter)?;
        let fence = IqrFence::from_values(values, self.fence_multiplier, &self.column)?;

        let mask: BooleanChunked = values
            .into_iter()
            .map(|value| value.is_some_and(|v| fence.contains(v)))
            .collect();
        let kept = df.filter(&mask).at_stage(Stage::OutlierFilter)?;

        let report = OutlierReport {
            column: self.column.clone(),
            fence,
            rows_in: df.height(),
            rows_kept: kept.height(),
        };

        log::debug!(
            "Fence for '{}': Q1={} Q3={} IQR={} -> [{}, {}]",
            report.column,
            fence.q1,
            fence.q3,
            fence.iqr,
            fence.lower,
            fence.upper
        );
        log::info!(
            "Outlier filter kept {} of {} rows ({} removed)",
            report.rows_kept,
            report.rows_in,
            report.rows_removed()
        );

        Ok((kept, report))
    }

    fn values(&self, df: &DataFrame) -> PipelineResult<Column> {
        let column = require_column(df, &self.column, Stage::OutlierFilter)?;
        if df.height() == 0 {
            return Err(PipelineError::EmptyInput {
                stage: Stage::OutlierFilter,
                column: self.column.clone(),
            });
        }
        if !column.dtype().is_primitive_numeric() && !column.dtype().is_null() {
            return Err(PipelineError::schema(
                Stage::OutlierFilter,
                self.column.as_str(),
                format!("expected a numeric column, found {}", column.dtype()),
            ));
        }
        column
            .cast(&DataType::Float64)
            .at_stage(Stage::OutlierFilter)
    }
}
