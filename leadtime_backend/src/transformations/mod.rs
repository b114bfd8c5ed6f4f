//! Target construction and table transformations.
//!
//! This module turns the main record table into a labelled one: it computes the
//! lead time target, filters target outliers and merges the extracted detail
//! columns back onto the surviving rows.
//!
//! # Modules
//!
//! - [`lead_time`]: Sort, group and compute minutes to the next report
//! - [`outliers`]: IQR fence filtering of a numeric column
//! - [`merge`]: Identifier-keyed reattachment of detail columns
//!
//! # Example
//!
//! ```no_run
//! use vessel_leadtime::transformations::{LeadTimeCalculator, OutlierFilter};
//! use polars::prelude::*;
//!
//! # fn example(main: DataFrame) -> vessel_leadtime::core::PipelineResult<()> {
//! let labelled = LeadTimeCalculator::default().calculate(&main)?;
//! let (kept, report) = OutlierFilter::default().apply(&labelled)?;
//! println!("kept {} rows inside [{}, {}]", kept.height(), report.fence.lower, report.fence.upper);
//! # Ok(())
//! # }
//! ```

pub mod lead_time;
pub mod merge;
pub mod outliers;

pub use lead_time::{minutes_between, LeadTimeCalculator, LeadTimeGrouping};
pub use merge::DetailMerger;
pub use outliers::{IqrFence, OutlierFilter, OutlierReport};
