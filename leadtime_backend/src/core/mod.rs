//! Core domain models for vessel report processing.
//!
//! This module defines the report structures, the shared column names, the
//! pipeline error type and the DataFrame helpers used by every stage.

pub mod domain;
pub mod error;
pub mod frame;

pub use error::{PipelineError, PipelineResult, Stage};
