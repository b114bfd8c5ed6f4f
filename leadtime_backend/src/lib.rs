//! Vessel lead-time preprocessing and feature pipeline.
//!
//! Turns raw vessel tracking reports into a supervised-learning dataset whose
//! target is the lead time: minutes until the vessel's next report with the
//! same navigational status code.
//!
//! Stages, in order: load ([`io`]), validate and flatten
//! ([`preprocessing`]), compute and filter the target, then merge details back
//! ([`transformations`]), and encode features ([`features`]). [`algorithms`]
//! scores predictions made by an external trainer.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod transformations;

pub use config::PipelineConfig;
pub use crate::core::{PipelineError, PipelineResult, Stage};
pub use preprocessing::{run_pipeline, PreprocessPipeline, TrainingSet};
