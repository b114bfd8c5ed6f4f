use polars::prelude::*;

use crate::core::domain::columns::{EPOCH_MILLIS, MMSI, NAV_CODE, ROW_ID, TIMESTAMP};
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;
use crate::transformations::merge::DetailMerger;

/// Builds the main record table: `row_id`, `epochMillis`, `mmsi` and a
/// millisecond `timestamp` derived from `epochMillis`.
pub struct MainDetailPreprocessor;

impl MainDetailPreprocessor {
    /// Select the main columns of `raw` and add `timestamp`.
    ///
    /// Row count and order are unchanged. A null `epochMillis` yields a null
    /// `timestamp`.
    pub fn process(raw: &DataFrame) -> PipelineResult<DataFrame> {
        require_column(raw, MMSI, Stage::MainDetails)?;
        let epoch = require_column(raw, EPOCH_MILLIS, Stage::MainDetails)?;
        if !epoch.dtype().is_integer() && !epoch.dtype().is_null() {
            return Err(PipelineError::schema(
                Stage::MainDetails,
                EPOCH_MILLIS,
                format!("expected integer milliseconds, found {}", epoch.dtype()),
            ));
        }
        if raw.column(ROW_ID).is_err() {
            return Err(PipelineError::alignment(
                Stage::MainDetails,
                "main records cannot be built without row identifiers",
            ));
        }

        let main = raw
            .clone()
            .lazy()
            .select([
                col(ROW_ID),
                col(EPOCH_MILLIS),
                col(MMSI),
                col(EPOCH_MILLIS)
                    .cast(DataType::Int64)
                    .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                    .alias(TIMESTAMP),
            ])
            .collect()
            .at_stage(Stage::MainDetails)?;

        log::debug!("Built {} main records", main.height());
        Ok(main)
    }

    /// Main records with `navCode` attached from the navigation details.
    pub fn with_nav_code(main: &DataFrame, navigation: &DataFrame) -> PipelineResult<DataFrame> {
        DetailMerger::attach(main, navigation, &[NAV_CODE], Stage::MainDetails)
    }
}
