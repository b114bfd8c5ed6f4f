use polars::prelude::*;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::core::domain::columns::LEAD_TIME;
use crate::core::domain::VesselReport;
use crate::core::error::{PipelineError, PipelineResult, Stage};
use crate::core::frame::has_row_ids;
use crate::features::{CategoryVocabulary, FeatureBuilder, FeatureSet};
use crate::io::loaders::{assign_row_ids, RecordLoader};
use crate::preprocessing::extractor::DetailExtractor;
use crate::preprocessing::main_details::MainDetailPreprocessor;
use crate::preprocessing::validator::{RecordValidator, ValidationResult};
use crate::transformations::lead_time::LeadTimeCalculator;
use crate::transformations::merge::DetailMerger;
use crate::transformations::outliers::{OutlierFilter, OutlierReport};

/// Row counts after each stage of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub loaded_records: usize,
    pub with_lead_time: usize,
    pub after_outlier_filter: usize,
    pub merged_records: usize,
}

/// Result of preprocessing operation
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Merged table: `mmsi, timestamp, lead_time, typeName, navDesc,
    /// courseOverGround, speedOverGround`.
    pub dataframe: DataFrame,
    pub validation: ValidationResult,
    pub outliers: OutlierReport,
    pub stats: StageCounts,
}

/// Features ready for the trainer together with the preprocessing summary.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: FeatureSet,
    pub preprocess: PreprocessResult,
}

/// Main preprocessing pipeline
pub struct PreprocessPipeline {
    config: PipelineConfig,
}

impl PreprocessPipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a report file and run every stage up to the detail merge.
    ///
    /// # Arguments
    /// * `path` - Parquet, JSON lines or JSON array file of vessel reports
    pub fn process(&self, path: &Path) -> PipelineResult<PreprocessResult> {
        let loaded = RecordLoader::load_from_file(path)?;
        self.process_frame(loaded.dataframe)
    }

    /// Process reports already held in memory.
    pub fn process_reports(&self, reports: &[VesselReport]) -> PipelineResult<PreprocessResult> {
        let loaded = RecordLoader::load_from_reports(reports)?;
        self.process_frame(loaded.dataframe)
    }

    /// Run the stages on a raw report table.
    ///
    /// `row_id` is assigned when the table does not carry one yet.
    pub fn process_frame(&self, raw: DataFrame) -> PipelineResult<PreprocessResult> {
        let raw = if has_row_ids(&raw) {
            raw
        } else {
            assign_row_ids(raw)?
        };

        // Step 1: Validate
        let validation = RecordValidator::validate_dataframe(&raw);
        for warning in &validation.warnings {
            log::warn!("{}", warning);
        }
        if !validation.is_valid {
            let column = validation.first_offending_column().unwrap_or_default();
            return Err(PipelineError::schema(
                Stage::Validate,
                column,
                validation.errors.join("; "),
            ));
        }

        // Step 2: Flatten nested details
        let navigation = DetailExtractor::navigation().extract(&raw)?;
        let vessel = DetailExtractor::vessel().extract(&raw)?;
        for (name, details) in [("navigation", &navigation), ("vessel", &vessel)] {
            if details.height() != raw.height() {
                return Err(PipelineError::alignment(
                    Stage::Extract,
                    format!(
                        "{} details have {} rows for {} records",
                        name,
                        details.height(),
                        raw.height()
                    ),
                ));
            }
        }

        // Step 3: Main records with status code
        let main = MainDetailPreprocessor::process(&raw)?;
        let main = MainDetailPreprocessor::with_nav_code(&main, &navigation)?;

        // Step 4: Target
        let calculator = LeadTimeCalculator::new(self.config.lead_time.grouping);
        let labelled = calculator.calculate(&main)?;
        let with_lead_time = labelled
            .column(LEAD_TIME)
            .map(|c| c.len() - c.null_count())
            .unwrap_or(0);

        // Step 5: Outliers
        let filter = OutlierFilter::new(
            self.config.outliers.column.as_str(),
            self.config.outliers.fence_multiplier,
        );
        let (filtered, outliers) = filter.apply(&labelled)?;

        // Step 6: Merge
        let merged = DetailMerger::merge(&filtered, &navigation, &vessel)?;

        let stats = StageCounts {
            loaded_records: raw.height(),
            with_lead_time,
            after_outlier_filter: filtered.height(),
            merged_records: merged.height(),
        };
        log::info!(
            "Preprocessed {} records: {} with lead time, {} after outlier filter, {} merged",
            stats.loaded_records,
            stats.with_lead_time,
            stats.after_outlier_filter,
            stats.merged_records
        );

        Ok(PreprocessResult {
            dataframe: merged,
            validation,
            outliers,
            stats,
        })
    }

    /// Build features from a merged table, applying the vocabulary policy.
    ///
    /// A configured vocabulary file is reused when it exists and written from
    /// this batch when it does not. Without a configured path the vocabulary is
    /// fitted in memory.
    pub fn build_features(&self, merged: &DataFrame) -> PipelineResult<FeatureSet> {
        match &self.config.vocabulary.path {
            Some(path) if path.exists() => {
                let vocabulary = CategoryVocabulary::load(path)?;
                FeatureBuilder::with_vocabulary(vocabulary).build(merged)
            }
            Some(path) => {
                let features = FeatureBuilder::new().build(merged)?;
                features.vocabulary.save(path)?;
                Ok(features)
            }
            None => FeatureBuilder::new().build(merged),
        }
    }

    /// Load the configured dataset and produce the training set.
    pub fn build_training_set(&self) -> PipelineResult<TrainingSet> {
        let preprocess = self.process(&self.config.dataset_path)?;
        let features = self.build_features(&preprocess.dataframe)?;
        Ok(TrainingSet {
            features,
            preprocess,
        })
    }
}

impl Default for PreprocessPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `config` and run the whole pipeline on its dataset.
pub fn run_pipeline(config: &PipelineConfig) -> PipelineResult<TrainingSet> {
    config.validate()?;
    PreprocessPipeline::with_config(config.clone()).build_training_set()
}

/// Convenience function to preprocess a report file with default settings
pub fn preprocess_file(path: &Path) -> PipelineResult<PreprocessResult> {
    PreprocessPipeline::new().process(path)
}
