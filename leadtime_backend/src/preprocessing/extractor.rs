//! Flattening of nested per-row structures.

use polars::prelude::*;

use crate::core::domain::columns::{NAVIGATION, ROW_ID, VESSEL_DETAILS};
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;

/// Flattens one struct column into a detail table.
///
/// The output holds `row_id` followed by one column per struct field, with the
/// same row count and order as the input. A row whose whole structure is null
/// yields nulls in every field column. A column that is null on every row and
/// carries no field layout (JSON inference types it as `Null`) yields
/// `row_id` alone.
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    source: String,
}

impl DetailExtractor {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Extractor for the `navigation` column.
    pub fn navigation() -> Self {
        Self::new(NAVIGATION)
    }

    /// Extractor for the `vesselDetails` column.
    pub fn vessel() -> Self {
        Self::new(VESSEL_DETAILS)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn extract(&self, df: &DataFrame) -> PipelineResult<DataFrame> {
        let nested = require_column(df, &self.source, Stage::Extract)?;
        match nested.dtype() {
            DataType::Struct(_) | DataType::Null => {}
            other => {
                return Err(PipelineError::schema(
                    Stage::Extract,
                    self.source.as_str(),
                    format!("expected a nested structure, found {}", other),
                ));
            }
        }

        let row_id = df.column(ROW_ID).map_err(|_| {
            PipelineError::alignment(
                Stage::Extract,
                format!("'{}' cannot be extracted without row identifiers", self.source),
            )
        })?;

        if nested.dtype() == &DataType::Null {
            log::warn!(
                "'{}' is missing on all {} rows; no fields extracted",
                self.source,
                df.height()
            );
            return DataFrame::new(vec![row_id.clone()]).at_stage(Stage::Extract);
        }

        let nested = nested.as_materialized_series();
        let fields = nested.struct_().at_stage(Stage::Extract)?.fields_as_series();

        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push(row_id.clone());

        if nested.null_count() > 0 {
            let present = nested.is_not_null();
            for field in fields {
                let missing = Series::full_null(field.name().clone(), field.len(), field.dtype());
                let field = field.zip_with(&present, &missing).at_stage(Stage::Extract)?;
                columns.push(Column::from(field));
            }
        } else {
            columns.extend(fields.into_iter().map(Column::from));
        }

        let details = DataFrame::new(columns).at_stage(Stage::Extract)?;
        log::debug!(
            "Extracted {} fields from '{}' over {} rows",
            details.width() - 1,
            self.source,
            details.height()
        );
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::columns::{COURSE_OVER_GROUND, NAV_CODE, NAV_DESC, TYPE_NAME};
    use crate::io::loaders::RecordLoader;

    const REPORTS: &str = r#"{"epochMillis": 3000, "mmsi": 2, "navigation": {"navCode": 5, "navDesc": "Moored", "courseOverGround": 0.0, "speedOverGround": 0.0}, "vesselDetails": {"typeName": "Tanker"}}
{"epochMillis": 1000, "mmsi": 1, "navigation": {"navCode": 0, "courseOverGround": 90.5, "speedOverGround": 10.0}, "vesselDetails": {"typeName": "Cargo"}}
{"epochMillis": 2000, "mmsi": 1, "navigation": null, "vesselDetails": {"typeName": "Cargo"}}
"#;

    #[test]
    fn test_extract_preserves_order_and_count() {
        let raw = RecordLoader::load_from_ndjson_str(REPORTS).unwrap().dataframe;
        let nav = DetailExtractor::navigation().extract(&raw).unwrap();

        assert_eq!(nav.height(), raw.height());
        let names: Vec<&str> = nav.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names[0], ROW_ID);
        assert!(names.contains(&NAV_CODE));
        assert!(names.contains(&NAV_DESC));
        assert!(names.contains(&COURSE_OVER_GROUND));

        let codes: Vec<Option<i64>> = nav
            .column(NAV_CODE)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(codes, vec![Some(5), Some(0), None]);
    }

    #[test]
    fn test_missing_key_yields_null() {
        let raw = RecordLoader::load_from_ndjson_str(REPORTS).unwrap().dataframe;
        let nav = DetailExtractor::navigation().extract(&raw).unwrap();

        let descs: Vec<Option<&str>> = nav
            .column(NAV_DESC)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(descs, vec![Some("Moored"), None, None]);
    }

    #[test]
    fn test_vessel_extraction() {
        let raw = RecordLoader::load_from_ndjson_str(REPORTS).unwrap().dataframe;
        let vessel = DetailExtractor::vessel().extract(&raw).unwrap();
        let types: Vec<Option<&str>> = vessel
            .column(TYPE_NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(types, vec![Some("Tanker"), Some("Cargo"), Some("Cargo")]);
    }

    #[test]
    fn test_non_struct_column_is_schema_error() {
        let df = df!(ROW_ID => &[0u64], NAVIGATION => &["not a mapping"]).unwrap();
        let err = DetailExtractor::navigation().extract(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { stage: Stage::Extract, ref column, .. } if column == NAVIGATION
        ));
    }

    #[test]
    fn test_null_typed_column_is_all_missing() {
        let df = DataFrame::new(vec![
            Column::new(ROW_ID.into(), &[0u64, 1]),
            Series::full_null(VESSEL_DETAILS.into(), 2, &DataType::Null).into(),
        ])
        .unwrap();

        let vessel = DetailExtractor::vessel().extract(&df).unwrap();
        assert_eq!(vessel.height(), 2);
        let names: Vec<&str> = vessel.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec![ROW_ID]);
    }

    #[test]
    fn test_absent_column_is_schema_error() {
        let df = df!(ROW_ID => &[0u64]).unwrap();
        let err = DetailExtractor::vessel().extract(&df).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }
}
