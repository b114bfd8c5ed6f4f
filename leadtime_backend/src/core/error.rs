//! Error types for pipeline operations.

use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Validate,
    Extract,
    MainDetails,
    LeadTime,
    OutlierFilter,
    Merge,
    Features,
    Vocabulary,
    Evaluation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Validate => "validate",
            Stage::Extract => "extract",
            Stage::MainDetails => "main-details",
            Stage::LeadTime => "lead-time",
            Stage::OutlierFilter => "outlier-filter",
            Stage::Merge => "merge",
            Stage::Features => "features",
            Stage::Vocabulary => "vocabulary",
            Stage::Evaluation => "evaluation",
        };
        f.write_str(name)
    }
}

/// Error type for pipeline operations
///
/// Every variant is fatal: a run either completes or aborts with one of these.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("[{stage}] schema error on '{column}': {reason}")]
    Schema {
        stage: Stage,
        column: String,
        reason: String,
    },

    #[error("[{stage}] no usable values in '{column}'")]
    EmptyInput { stage: Stage, column: String },

    #[error("[{stage}] alignment error: {reason}")]
    Alignment { stage: Stage, reason: String },

    #[error("[{stage}] unknown category '{value}' in column '{column}'")]
    UnknownCategory {
        stage: Stage,
        column: String,
        value: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{stage}] dataframe error: {source}")]
    Polars {
        stage: Stage,
        #[source]
        source: PolarsError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn schema(stage: Stage, column: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Schema {
            stage,
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(stage: Stage, column: &str) -> Self {
        Self::schema(stage, column, "column not found")
    }

    pub fn alignment(stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::Alignment {
            stage,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stage the error was raised in, if it is bound to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Schema { stage, .. }
            | PipelineError::EmptyInput { stage, .. }
            | PipelineError::Alignment { stage, .. }
            | PipelineError::UnknownCategory { stage, .. }
            | PipelineError::Polars { stage, .. } => Some(*stage),
            PipelineError::Configuration(_)
            | PipelineError::Io { .. }
            | PipelineError::Serialization(_) => None,
        }
    }
}

/// Tags a Polars failure with the stage it happened in.
pub trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> PipelineResult<T>;
}

impl<T> AtStage<T> for Result<T, PolarsError> {
    fn at_stage(self, stage: Stage) -> PipelineResult<T> {
        self.map_err(|source| PipelineError::Polars { stage, source })
    }
}
