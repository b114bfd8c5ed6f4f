//! Pipeline configuration file support.
//!
//! This module reads the pipeline configuration from TOML. The configuration is
//! an explicit value handed to [`PreprocessPipeline`](crate::preprocessing::PreprocessPipeline);
//! nothing in the crate reads paths or constants from process-wide state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::domain::columns::LEAD_TIME;
use crate::core::error::{PipelineError, PipelineResult};
use crate::transformations::lead_time::LeadTimeGrouping;

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    #[serde(default)]
    pub lead_time: LeadTimeSettings,
    #[serde(default)]
    pub outliers: OutlierSettings,
    #[serde(default)]
    pub vocabulary: VocabularySettings,
}

/// Lead time computation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeSettings {
    #[serde(default)]
    pub grouping: LeadTimeGrouping,
}

/// Outlier filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSettings {
    #[serde(default = "default_outlier_column")]
    pub column: String,
    #[serde(default = "default_fence_multiplier")]
    pub fence_multiplier: f64,
}

/// Category vocabulary persistence settings.
///
/// When `path` is set and the file exists, the stored vocabulary is reused;
/// when it is set but missing, the vocabulary fitted on this batch is written there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularySettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/vessel_reports.parquet")
}

fn default_outlier_column() -> String {
    LEAD_TIME.to_string()
}

fn default_fence_multiplier() -> f64 {
    1.5
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            column: default_outlier_column(),
            fence_multiplier: default_fence_multiplier(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            lead_time: LeadTimeSettings::default(),
            outliers: OutlierSettings::default(),
            vocabulary: VocabularySettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Configuration with defaults for everything but the dataset location.
    pub fn for_dataset<P: Into<PathBuf>>(dataset_path: P) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let config: PipelineConfig = toml::from_str(content).map_err(|e| {
            PipelineError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load pipeline configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(PipelineConfig)` if successful
    /// * `Err(PipelineError)` if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| PipelineError::io(path.as_ref(), e))?;
        Self::from_toml_str(&content)
    }

    /// Load pipeline configuration from the default location.
    ///
    /// Searches for `pipeline.toml` in:
    /// 1. Current directory
    /// 2. `leadtime_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> PipelineResult<Self> {
        let search_paths = [
            PathBuf::from("pipeline.toml"),
            PathBuf::from("leadtime_backend/pipeline.toml"),
            PathBuf::from("../pipeline.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Using pipeline configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(PipelineError::Configuration(
            "No pipeline.toml found in standard locations".to_string(),
        ))
    }

    /// Check value ranges that the type system does not enforce.
    pub fn validate(&self) -> PipelineResult<()> {
        let multiplier = self.outliers.fence_multiplier;
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "outliers.fence_multiplier must be a finite, non-negative number, got {}",
                multiplier
            )));
        }

        if self.outliers.column.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "outliers.column must not be empty".to_string(),
            ));
        }

        if self.dataset_path.as_os_str().is_empty() {
            return Err(PipelineError::Configuration(
                "dataset_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
