//! Lead time target computation.
//!
//! The lead time of a report is the number of minutes until the next report in
//! the same group, where groups share a navigational status code and, by
//! default, a vessel.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::domain::columns::{LEAD_TIME, MMSI, NAV_CODE, TIMESTAMP};
use crate::core::domain::MILLIS_PER_MINUTE;
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;

/// Which rows form a lead-time group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTimeGrouping {
    /// Rows sharing both `mmsi` and `navCode`.
    #[default]
    VesselAndStatus,
    /// Rows sharing `navCode`, across vessels.
    StatusOnly,
}

/// Adds `lead_time` (minutes, nullable) to a main record table.
///
/// Rows are stably sorted by `(mmsi, timestamp)` with nulls last; within a
/// group each row's lead time is the gap to the following row of that group.
/// The last row of a group, rows with a null `navCode` (and, for
/// [`LeadTimeGrouping::VesselAndStatus`], a null `mmsi`) get a null lead time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadTimeCalculator {
    grouping: LeadTimeGrouping,
}

impl LeadTimeCalculator {
    pub fn new(grouping: LeadTimeGrouping) -> Self {
        Self { grouping }
    }

    pub fn grouping(&self) -> LeadTimeGrouping {
        self.grouping
    }

    /// Sort `df` and append the `lead_time` column.
    ///
    /// Requires `mmsi`, `timestamp` (a `Datetime` of any unit) and `navCode`;
    /// all other columns (notably `row_id`) travel with their rows.
    pub fn calculate(&self, df: &DataFrame) -> PipelineResult<DataFrame> {
        for name in [MMSI, TIMESTAMP, NAV_CODE] {
            require_column(df, name, Stage::LeadTime)?;
        }
        let timestamp_dtype = require_column(df, TIMESTAMP, Stage::LeadTime)?.dtype();
        if !matches!(timestamp_dtype, DataType::Datetime(_, _)) {
            return Err(PipelineError::schema(
                Stage::LeadTime,
                TIMESTAMP,
                format!("expected a datetime column, found {}", timestamp_dtype),
            ));
        }

        let mut sorted = df
            .sort(
                [MMSI, TIMESTAMP],
                SortMultipleOptions::default()
                    .with_maintain_order(true)
                    .with_nulls_last(true),
            )
            .at_stage(Stage::LeadTime)?;

        let lead_times = self.lead_times(&sorted)?;
        let with_target = lead_times.iter().filter(|v| v.is_some()).count();

        sorted
            .with_column(Column::new(LEAD_TIME.into(), lead_times))
            .at_stage(Stage::LeadTime)?;

        log::info!(
            "Computed lead time for {} of {} rows ({:?} grouping)",
            with_target,
            sorted.height(),
            self.grouping
        );

        Ok(sorted)
    }

    /// Lead times for an already sorted table, in row order.
    fn lead_times(&self, sorted: &DataFrame) -> PipelineResult<Vec<Option<f64>>> {
        let vessels = require_column(sorted, MMSI, Stage::LeadTime)?
            .cast(&DataType::String)
            .at_stage(Stage::LeadTime)?;
        let vessels: Vec<Option<&str>> =
            vessels.str().at_stage(Stage::LeadTime)?.into_iter().collect();

        let codes = require_column(sorted, NAV_CODE, Stage::LeadTime)?
            .cast(&DataType::String)
            .at_stage(Stage::LeadTime)?;
        let codes: Vec<Option<&str>> =
            codes.str().at_stage(Stage::LeadTime)?.into_iter().collect();

        let timestamps = require_column(sorted, TIMESTAMP, Stage::LeadTime)?
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .and_then(|ts| ts.cast(&DataType::Int64))
            .at_stage(Stage::LeadTime)?;
        let timestamps: Vec<Option<i64>> =
            timestamps.i64().at_stage(Stage::LeadTime)?.into_iter().collect();

        let mut lead_times = vec![None; sorted.height()];
        // Timestamp of the row that follows in each group, filled walking backwards.
        let mut next_in_group: HashMap<(Option<&str>, &str), Option<i64>> = HashMap::new();

        for i in (0..sorted.height()).rev() {
            let Some(code) = codes[i] else {
                continue;
            };
            let key = match self.grouping {
                LeadTimeGrouping::VesselAndStatus => match vessels[i] {
                    Some(vessel) => (Some(vessel), code),
                    None => continue,
                },
                LeadTimeGrouping::StatusOnly => (None, code),
            };

            if let Some(next) = next_in_group.insert(key, timestamps[i]) {
                lead_times[i] = match (timestamps[i], next) {
                    (Some(current), Some(next)) => Some(minutes_between(current, next)),
                    _ => None,
                };
            }
        }

        Ok(lead_times)
    }
}

/// Minutes elapsed from `from_millis` to `to_millis`.
pub fn minutes_between(from_millis: i64, to_millis: i64) -> f64 {
    (i128::from(to_millis) - i128::from(from_millis)) as f64 / MILLIS_PER_MINUTE
}
