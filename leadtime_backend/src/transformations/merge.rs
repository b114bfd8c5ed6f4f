use polars::prelude::*;

use crate::core::domain::columns::{
    COURSE_OVER_GROUND, LEAD_TIME, MMSI, NAV_DESC, SPEED_OVER_GROUND, TIMESTAMP, TYPE_NAME,
};
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::{require_column, row_id_positions, row_ids};

/// Reattaches extracted detail columns to main records by `row_id`.
///
/// Physical row position is never used to match rows: the main table has been
/// sorted and filtered since extraction, the detail tables have not.
pub struct DetailMerger;

impl DetailMerger {
    /// Rows of `detail` reordered to line up with the rows of `main`.
    ///
    /// Every identifier in `main` must appear exactly once in `detail`.
    pub fn align(main: &DataFrame, detail: &DataFrame, stage: Stage) -> PipelineResult<DataFrame> {
        let positions = row_id_positions(detail, stage)?;
        let indices = row_ids(main, stage)?
            .into_iter()
            .map(|id| {
                positions.get(&id).copied().ok_or_else(|| {
                    PipelineError::alignment(
                        stage,
                        format!("row identifier {id} has no matching detail row"),
                    )
                })
            })
            .collect::<PipelineResult<Vec<IdxSize>>>()?;

        let indices = IdxCa::from_vec(PlSmallStr::EMPTY, indices);
        detail.take(&indices).at_stage(stage)
    }

    /// Copy `columns` from `detail` onto `main`, matching rows by `row_id`.
    pub fn attach(
        main: &DataFrame,
        detail: &DataFrame,
        columns: &[&str],
        stage: Stage,
    ) -> PipelineResult<DataFrame> {
        let aligned = Self::align(main, detail, stage)?;
        let mut out = main.clone();
        for name in columns {
            let column = require_column(&aligned, name, stage)?.clone();
            out.with_column(column).at_stage(stage)?;
        }
        Ok(out)
    }

    /// Merge navigation and vessel details into the main records and drop rows
    /// without a lead time.
    ///
    /// Output columns: `mmsi, timestamp, lead_time, typeName, navDesc,
    /// courseOverGround, speedOverGround`.
    pub fn merge(
        main: &DataFrame,
        navigation: &DataFrame,
        vessel: &DataFrame,
    ) -> PipelineResult<DataFrame> {
        let target = require_column(main, LEAD_TIME, Stage::Merge)?;
        let with_target = main
            .filter(&target.is_not_null())
            .at_stage(Stage::Merge)?;

        let navigation = Self::align(&with_target, navigation, Stage::Merge)?;
        let vessel = Self::align(&with_target, vessel, Stage::Merge)?;

        let merged = DataFrame::new(vec![
            require_column(&with_target, MMSI, Stage::Merge)?.clone(),
            require_column(&with_target, TIMESTAMP, Stage::Merge)?.clone(),
            require_column(&with_target, LEAD_TIME, Stage::Merge)?.clone(),
            require_column(&vessel, TYPE_NAME, Stage::Merge)?.clone(),
            require_column(&navigation, NAV_DESC, Stage::Merge)?.clone(),
            require_column(&navigation, COURSE_OVER_GROUND, Stage::Merge)?.clone(),
            require_column(&navigation, SPEED_OVER_GROUND, Stage::Merge)?.clone(),
        ])
        .at_stage(Stage::Merge)?;

        log::info!(
            "Merged details into {} rows ({} dropped without lead time)",
            merged.height(),
            main.height() - merged.height()
        );

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::columns::{MERGED, NAV_CODE, ROW_ID};

    fn navigation_details() -> DataFrame {
        df!(
            ROW_ID => &[0u64, 1, 2],
            NAV_CODE => &[0i64, 5, 0],
            NAV_DESC => &["Under way", "Moored", "Under way"],
            COURSE_OVER_GROUND => &[10.0, 0.0, 30.0],
            SPEED_OVER_GROUND => &[12.0, 0.0, 14.0]
        )
        .unwrap()
    }

    fn vessel_details() -> DataFrame {
        df!(
            ROW_ID => &[0u64, 1, 2],
            TYPE_NAME => &["Cargo", "Tanker", "Cargo"]
        )
        .unwrap()
    }

    /// Main records in a different order than the details, as after sorting.
    fn sorted_main() -> DataFrame {
        df!(
            ROW_ID => &[2u64, 0, 1],
            MMSI => &[1i64, 1, 2],
            TIMESTAMP => &[0i64, 60_000, 0],
            LEAD_TIME => &[Some(1.0), None, Some(4.0)]
        )
        .unwrap()
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_merge_matches_by_row_id_not_position() {
        let merged =
            DetailMerger::merge(&sorted_main(), &navigation_details(), &vessel_details()).unwrap();

        assert_eq!(merged.height(), 2);
        assert_eq!(
            strings(&merged, NAV_DESC),
            vec![Some("Under way".to_string()), Some("Moored".to_string())]
        );
        assert_eq!(
            strings(&merged, TYPE_NAME),
            vec![Some("Cargo".to_string()), Some("Tanker".to_string())]
        );
        let courses: Vec<Option<f64>> = merged
            .column(COURSE_OVER_GROUND)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(courses, vec![Some(30.0), Some(0.0)]);
    }

    #[test]
    fn test_merge_output_columns() {
        let merged =
            DetailMerger::merge(&sorted_main(), &navigation_details(), &vessel_details()).unwrap();
        let names: Vec<&str> = merged
            .get_column_names()
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(names, MERGED.to_vec());
    }

    #[test]
    fn test_merge_never_adds_rows() {
        let main = sorted_main();
        let merged = DetailMerger::merge(&main, &navigation_details(), &vessel_details()).unwrap();
        assert!(merged.height() <= main.height());
    }

    #[test]
    fn test_missing_identifier_is_alignment_error() {
        let vessel = df!(ROW_ID => &[0u64, 1], TYPE_NAME => &["Cargo", "Tanker"]).unwrap();
        let err = DetailMerger::merge(&sorted_main(), &navigation_details(), &vessel).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Alignment { stage: Stage::Merge, .. }
        ));
    }

    #[test]
    fn test_detail_without_row_ids_is_alignment_error() {
        let vessel = df!(TYPE_NAME => &["Cargo", "Tanker", "Cargo"]).unwrap();
        let err = DetailMerger::merge(&sorted_main(), &navigation_details(), &vessel).unwrap_err();
        assert!(matches!(err, PipelineError::Alignment { .. }));
    }

    #[test]
    fn test_missing_detail_column_is_schema_error() {
        let vessel = df!(ROW_ID => &[0u64, 1, 2]).unwrap();
        let err = DetailMerger::merge(&sorted_main(), &navigation_details(), &vessel).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { stage: Stage::Merge, ref column, .. } if column == TYPE_NAME
        ));
    }

    #[test]
    fn test_attach_nav_code() {
        let main = df!(ROW_ID => &[1u64, 2], MMSI => &[9i64, 9]).unwrap();
        let out =
            DetailMerger::attach(&main, &navigation_details(), &[NAV_CODE], Stage::MainDetails)
                .unwrap();
        let codes: Vec<Option<i64>> = out
            .column(NAV_CODE)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(codes, vec![Some(5), Some(0)]);
        assert_eq!(out.width(), 3);
    }
}
