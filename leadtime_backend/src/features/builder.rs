use polars::prelude::*;

use crate::core::domain::columns::{CATEGORICAL_FEATURES, LEAD_TIME, NUMERIC_FEATURES};
use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;

use super::vocabulary::CategoryVocabulary;

/// Model inputs: numeric columns as `f64`, then Boolean indicator columns.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    frame: DataFrame,
}

impl FeatureMatrix {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Dense row-major export. Indicators become `1.0`/`0.0`, nulls `NaN`.
    pub fn to_rows(&self) -> PipelineResult<Vec<Vec<f64>>> {
        let mut rows = vec![Vec::with_capacity(self.width()); self.height()];

        for column in self.frame.get_columns() {
            let values: Vec<f64> = if column.dtype() == &DataType::Boolean {
                column
                    .bool()
                    .at_stage(Stage::Features)?
                    .into_iter()
                    .map(|v| match v {
                        Some(true) => 1.0,
                        Some(false) => 0.0,
                        None => f64::NAN,
                    })
                    .collect()
            } else {
                column
                    .cast(&DataType::Float64)
                    .at_stage(Stage::Features)?
                    .f64()
                    .at_stage(Stage::Features)?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect()
            };

            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }

        Ok(rows)
    }
}

/// Regression target: lead time in minutes, row-aligned with the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetVector {
    values: Vec<f64>,
}

impl TargetVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub matrix: FeatureMatrix,
    pub target: TargetVector,
    pub vocabulary: CategoryVocabulary,
}

/// Builds the feature matrix and target from the merged table.
///
/// Without a vocabulary the categorical columns are fitted on the input batch;
/// with one, the input is encoded against it and unseen categories fail.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    vocabulary: Option<CategoryVocabulary>,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocabulary(vocabulary: CategoryVocabulary) -> Self {
        Self {
            vocabulary: Some(vocabulary),
        }
    }

    pub fn build(&self, merged: &DataFrame) -> PipelineResult<FeatureSet> {
        let target = Self::target(merged)?;

        let vocabulary = match &self.vocabulary {
            Some(vocabulary) => {
                if vocabulary.column_names() != CATEGORICAL_FEATURES {
                    return Err(PipelineError::Configuration(format!(
                        "Category vocabulary covers {:?}, expected {:?}",
                        vocabulary.column_names(),
                        CATEGORICAL_FEATURES
                    )));
                }
                vocabulary.clone()
            }
            None => CategoryVocabulary::fit(merged, &CATEGORICAL_FEATURES)?,
        };

        let mut columns = Vec::with_capacity(NUMERIC_FEATURES.len());
        for name in NUMERIC_FEATURES {
            let numeric = require_column(merged, name, Stage::Features)?;
            if !numeric.dtype().is_primitive_numeric() && !numeric.dtype().is_null() {
                return Err(PipelineError::schema(
                    Stage::Features,
                    name,
                    format!("expected a numeric column, found {}", numeric.dtype()),
                ));
            }
            columns.push(numeric.cast(&DataType::Float64).at_stage(Stage::Features)?);
        }
        columns.extend(vocabulary.encode(merged)?);

        let frame = DataFrame::new(columns).at_stage(Stage::Features)?;
        log::info!(
            "Built feature matrix with {} rows and {} columns",
            frame.height(),
            frame.width()
        );

        Ok(FeatureSet {
            matrix: FeatureMatrix { frame },
            target,
            vocabulary,
        })
    }

    fn target(merged: &DataFrame) -> PipelineResult<TargetVector> {
        let lead_time = require_column(merged, LEAD_TIME, Stage::Features)?
            .cast(&DataType::Float64)
            .at_stage(Stage::Features)?;
        if lead_time.null_count() > 0 {
            return Err(PipelineError::schema(
                Stage::Features,
                LEAD_TIME,
                format!("{} rows have no target value", lead_time.null_count()),
            ));
        }
        let values = lead_time
            .f64()
            .at_stage(Stage::Features)?
            .into_no_null_iter()
            .collect();
        Ok(TargetVector { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::columns::{
        COURSE_OVER_GROUND, MMSI, NAV_DESC, SPEED_OVER_GROUND, TYPE_NAME,
    };
    use crate::features::vocabulary::CategoricalColumn;

    fn merged() -> DataFrame {
        df!(
            MMSI => &[1i64, 1, 2],
            LEAD_TIME => &[5.0, 10.0, 2.5],
            TYPE_NAME => &["Tanker", "Tanker", "Cargo"],
            NAV_DESC => &[Some("Under way"), Some("Moored"), None],
            COURSE_OVER_GROUND => &[Some(90.0), None, Some(180.0)],
            SPEED_OVER_GROUND => &[12i64, 0, 8]
        )
        .unwrap()
    }

    #[test]
    fn test_column_order() {
        let features = FeatureBuilder::new().build(&merged()).unwrap();
        assert_eq!(
            features.matrix.column_names(),
            vec![
                "courseOverGround",
                "speedOverGround",
                "navDesc_Moored",
                "navDesc_Under way",
                "navDesc___missing__",
                "typeName_Cargo",
                "typeName_Tanker",
            ]
        );
        assert_eq!(features.target.as_slice(), &[5.0, 10.0, 2.5]);
        assert_eq!(features.matrix.height(), features.target.len());
    }

    #[test]
    fn test_dense_rows() {
        let features = FeatureBuilder::new().build(&merged()).unwrap();
        let rows = features.matrix.to_rows().unwrap();

        assert_eq!(rows[0], vec![90.0, 12.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert!(rows[1][0].is_nan());
        assert_eq!(rows[2][4], 1.0);
    }

    #[test]
    fn test_one_indicator_per_categorical_column() {
        let features = FeatureBuilder::new().build(&merged()).unwrap();
        let frame = features.matrix.frame();

        for prefix in ["navDesc_", "typeName_"] {
            let indicators: Vec<&Column> = frame
                .get_columns()
                .iter()
                .filter(|c| c.name().starts_with(prefix))
                .collect();
            for row in 0..frame.height() {
                let set = indicators
                    .iter()
                    .filter(|c| c.bool().unwrap().get(row) == Some(true))
                    .count();
                assert_eq!(set, 1, "row {row} of {prefix}*");
            }
        }
    }

    #[test]
    fn test_null_target_is_schema_error() {
        let mut df = merged();
        df.with_column(Column::new(LEAD_TIME.into(), &[Some(1.0), None, Some(2.0)]))
            .unwrap();
        let err = FeatureBuilder::new().build(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { stage: Stage::Features, ref column, .. } if column == LEAD_TIME
        ));
    }

    #[test]
    fn test_fixed_vocabulary_keeps_columns() {
        let fitted = FeatureBuilder::new().build(&merged()).unwrap();
        let subset = merged().slice(0, 1);

        let refit = FeatureBuilder::new().build(&subset).unwrap();
        assert_eq!(refit.matrix.width(), 4);

        let fixed = FeatureBuilder::with_vocabulary(fitted.vocabulary.clone())
            .build(&subset)
            .unwrap();
        assert_eq!(fixed.matrix.column_names(), fitted.matrix.column_names());
    }

    #[test]
    fn test_vocabulary_for_other_columns_rejected() {
        let vocabulary = CategoryVocabulary::from_columns(vec![CategoricalColumn {
            name: TYPE_NAME.to_string(),
            categories: vec!["Cargo".to_string(), "Tanker".to_string()],
        }])
        .unwrap();
        let err = FeatureBuilder::with_vocabulary(vocabulary)
            .build(&merged())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
