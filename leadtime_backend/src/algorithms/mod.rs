//! Model evaluation.
//!
//! - [`metrics`]: Regression error metrics for lead time predictions

pub mod metrics;

pub use metrics::{evaluate, RegressionMetrics};
