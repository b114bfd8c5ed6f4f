//! DataFrame helpers shared by the pipeline stages.
//!
//! Column lookups that fail are reported as schema errors naming the stage, and
//! the row identifier helpers keep every stage agreeing on how `row_id` is read.

use std::collections::HashMap;

use polars::prelude::*;

use super::domain::columns::ROW_ID;
use super::error::{AtStage, PipelineError, PipelineResult, Stage};

/// Look up a column, reporting a schema error for `stage` when it is absent.
pub fn require_column<'a>(
    df: &'a DataFrame,
    name: &str,
    stage: Stage,
) -> PipelineResult<&'a Column> {
    df.column(name)
        .map_err(|_| PipelineError::missing_column(stage, name))
}

/// Whether the frame carries a row identifier column.
pub fn has_row_ids(df: &DataFrame) -> bool {
    df.column(ROW_ID).is_ok()
}

/// Read the row identifiers of a frame in row order.
///
/// Fails with an alignment error if the column is missing or holds nulls: a
/// frame without intact identifiers cannot be matched against its sources.
pub fn row_ids(df: &DataFrame, stage: Stage) -> PipelineResult<Vec<u64>> {
    let column = df.column(ROW_ID).map_err(|_| {
        PipelineError::alignment(stage, format!("table carries no '{}' column", ROW_ID))
    })?;
    let ids = column.u64().at_stage(stage)?;

    ids.into_iter()
        .enumerate()
        .map(|(position, id)| {
            id.ok_or_else(|| {
                PipelineError::alignment(stage, format!("null row identifier at position {position}"))
            })
        })
        .collect()
}

/// Map each row identifier to its physical position in `df`.
///
/// Duplicate identifiers are an alignment error.
pub fn row_id_positions(df: &DataFrame, stage: Stage) -> PipelineResult<HashMap<u64, IdxSize>> {
    let ids = row_ids(df, stage)?;
    let mut positions = HashMap::with_capacity(ids.len());

    for (position, id) in ids.into_iter().enumerate() {
        if positions.insert(id, position as IdxSize).is_some() {
            return Err(PipelineError::alignment(
                stage,
                format!("duplicate row identifier {id}"),
            ));
        }
    }

    Ok(positions)
}

/// Build the `row_id` column for a table of `height` rows.
pub fn row_id_column(height: usize) -> Column {
    Column::new(ROW_ID.into(), (0..height as u64).collect::<Vec<u64>>())
}
