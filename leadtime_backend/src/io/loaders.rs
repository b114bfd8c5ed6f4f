use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use crate::core::domain::columns::{
    COURSE_OVER_GROUND, EPOCH_MILLIS, MMSI, NAVIGATION, NAV_CODE, NAV_DESC, ROW_ID,
    SPEED_OVER_GROUND, TYPE_NAME, VESSEL_DETAILS, VESSEL_NAME,
};
use crate::core::domain::VesselReport;
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::{has_row_ids, row_id_column};

/// Represents the source format of report data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSourceType {
    Parquet,
    JsonLines,
    Json,
    InMemory,
}

/// Result of loading report data
#[derive(Debug)]
pub struct RecordLoadResult {
    pub dataframe: DataFrame,
    pub source_type: RecordSourceType,
    pub num_records: usize,
}

impl RecordLoadResult {
    pub fn new(dataframe: DataFrame, source_type: RecordSourceType) -> Self {
        let num_records = dataframe.height();
        Self {
            dataframe,
            source_type,
            num_records,
        }
    }
}

/// Unified interface for loading vessel reports.
///
/// Every loader assigns the `row_id` column before returning, so downstream
/// stages can always match derived tables back to their source rows.
pub struct RecordLoader;

impl RecordLoader {
    /// Load reports from a file (auto-detects Parquet, JSON lines or JSON)
    pub fn load_from_file(path: &Path) -> PipelineResult<RecordLoadResult> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "File has no extension: {}",
                    path.display()
                ))
            })?;

        match extension.to_lowercase().as_str() {
            "parquet" => Self::load_from_parquet(path),
            "jsonl" | "ndjson" => Self::load_from_ndjson(path),
            "json" => Self::load_from_json(path),
            other => Err(PipelineError::Configuration(format!(
                "Unsupported file format: {}",
                other
            ))),
        }
    }

    /// Load reports from a Parquet file
    pub fn load_from_parquet(path: &Path) -> PipelineResult<RecordLoadResult> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let df = ParquetReader::new(file).finish().at_stage(Stage::Load)?;
        Self::finish(df, RecordSourceType::Parquet, path)
    }

    /// Load reports from a newline-delimited JSON file
    pub fn load_from_ndjson(path: &Path) -> PipelineResult<RecordLoadResult> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let df = JsonLineReader::new(file).finish().at_stage(Stage::Load)?;
        Self::finish(df, RecordSourceType::JsonLines, path)
    }

    /// Load reports from a file holding a JSON array of records
    pub fn load_from_json(path: &Path) -> PipelineResult<RecordLoadResult> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let df = JsonReader::new(file)
            .with_json_format(JsonFormat::Json)
            .finish()
            .at_stage(Stage::Load)?;
        Self::finish(df, RecordSourceType::Json, path)
    }

    /// Load reports from newline-delimited JSON text
    pub fn load_from_ndjson_str(content: &str) -> PipelineResult<RecordLoadResult> {
        let df = JsonLineReader::new(Cursor::new(content.as_bytes()))
            .finish()
            .at_stage(Stage::Load)?;
        let df = assign_row_ids(df)?;
        Ok(RecordLoadResult::new(df, RecordSourceType::JsonLines))
    }

    /// Load reports already held in memory
    pub fn load_from_reports(reports: &[VesselReport]) -> PipelineResult<RecordLoadResult> {
        let df = assign_row_ids(reports_to_dataframe(reports)?)?;
        Ok(RecordLoadResult::new(df, RecordSourceType::InMemory))
    }

    fn finish(
        df: DataFrame,
        source_type: RecordSourceType,
        path: &Path,
    ) -> PipelineResult<RecordLoadResult> {
        let df = assign_row_ids(df)?;
        log::info!(
            "Loaded {} records ({:?}) from {}",
            df.height(),
            source_type,
            path.display()
        );
        Ok(RecordLoadResult::new(df, source_type))
    }
}

/// Prepend the immutable `row_id` column (`0..height`, load order).
///
/// A source that already carries a `row_id` column is rejected: identifiers are
/// only ever assigned here.
pub fn assign_row_ids(mut df: DataFrame) -> PipelineResult<DataFrame> {
    if has_row_ids(&df) {
        return Err(PipelineError::schema(
            Stage::Load,
            ROW_ID,
            "source already carries a row identifier column",
        ));
    }

    let ids = row_id_column(df.height());
    df.insert_column(0, ids).at_stage(Stage::Load)?;
    Ok(df)
}

/// Convert typed reports into the raw columnar layout, with nested
/// `navigation` and `vesselDetails` struct columns.
pub fn reports_to_dataframe(reports: &[VesselReport]) -> PipelineResult<DataFrame> {
    let n = reports.len();

    let mut epoch_millis = Vec::with_capacity(n);
    let mut mmsi = Vec::with_capacity(n);
    let mut nav_codes = Vec::with_capacity(n);
    let mut nav_descs = Vec::with_capacity(n);
    let mut courses = Vec::with_capacity(n);
    let mut speeds = Vec::with_capacity(n);
    let mut type_names = Vec::with_capacity(n);
    let mut vessel_names = Vec::with_capacity(n);

    for report in reports {
        epoch_millis.push(report.epoch_millis);
        mmsi.push(report.mmsi);

        let nav = report.navigation.clone().unwrap_or_default();
        nav_codes.push(nav.nav_code);
        nav_descs.push(nav.nav_desc);
        courses.push(nav.course_over_ground);
        speeds.push(nav.speed_over_ground);

        let vessel = report.vessel_details.clone().unwrap_or_default();
        type_names.push(vessel.type_name);
        vessel_names.push(vessel.name);
    }

    let navigation = df!(
        NAV_CODE => nav_codes,
        NAV_DESC => nav_descs,
        COURSE_OVER_GROUND => courses,
        SPEED_OVER_GROUND => speeds
    )
    .at_stage(Stage::Load)?
    .into_struct(NAVIGATION.into())
    .into_series();

    let vessel_details = df!(
        TYPE_NAME => type_names,
        VESSEL_NAME => vessel_names
    )
    .at_stage(Stage::Load)?
    .into_struct(VESSEL_DETAILS.into())
    .into_series();

    DataFrame::new(vec![
        Column::new(EPOCH_MILLIS.into(), epoch_millis),
        Column::new(MMSI.into(), mmsi),
        Column::from(navigation),
        Column::from(vessel_details),
    ])
    .at_stage(Stage::Load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{NavigationDetail, VesselDetail};

    #[test]
    fn test_load_from_reports() {
        let reports = vec![
            VesselReport::new(1_000, 7).with_navigation(NavigationDetail {
                nav_code: Some(1),
                nav_desc: Some("At anchor".to_string()),
                course_over_ground: Some(10.0),
                speed_over_ground: Some(0.2),
            }),
            VesselReport::new(2_000, 8).with_vessel(VesselDetail {
                type_name: Some("Fishing".to_string()),
                name: Some("Sea Lark".to_string()),
            }),
        ];

        let result = RecordLoader::load_from_reports(&reports).unwrap();
        assert_eq!(result.source_type, RecordSourceType::InMemory);
        assert_eq!(result.num_records, 2);

        let col_names = result.dataframe.get_column_names();
        assert_eq!(col_names[0].as_str(), ROW_ID);
        assert!(col_names.iter().any(|s| s.as_str() == NAVIGATION));
        assert!(matches!(
            result.dataframe.column(NAVIGATION).unwrap().dtype(),
            DataType::Struct(_)
        ));
    }

    #[test]
    fn test_existing_row_id_rejected() {
        let df = df!(ROW_ID => &[0u64, 1], "mmsi" => &[1i64, 2]).unwrap();
        let err = assign_row_ids(df).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { stage: Stage::Load, .. }));
    }
}
