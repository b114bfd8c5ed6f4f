//! Record preprocessing: validation, detail extraction and the pipeline entry
//! point.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vessel_leadtime::config::PipelineConfig;
//! use vessel_leadtime::preprocessing::PreprocessPipeline;
//!
//! # fn example() -> vessel_leadtime::core::PipelineResult<()> {
//! let config = PipelineConfig::from_file(Path::new("pipeline.toml"))?;
//! let pipeline = PreprocessPipeline::with_config(config);
//! let training = pipeline.build_training_set()?;
//! println!(
//!     "{} training rows, {} features",
//!     training.features.matrix.height(),
//!     training.features.matrix.width()
//! );
//! # Ok(())
//! # }
//! ```

pub mod extractor;
pub mod main_details;
pub mod pipeline;
pub mod validator;

pub use extractor::DetailExtractor;
pub use main_details::MainDetailPreprocessor;
pub use pipeline::{
    preprocess_file, run_pipeline, PreprocessPipeline, PreprocessResult, StageCounts, TrainingSet,
};
pub use validator::{RecordValidator, ValidationResult, ValidationStats};
