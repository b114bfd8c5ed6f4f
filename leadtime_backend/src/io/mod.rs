//! High-level data loading utilities.
//!
//! This module provides loaders that read vessel reports into a Polars
//! DataFrame and stamp every row with the immutable `row_id` identifier. The
//! format is detected from the file extension.
//!
//! # Example
//!
//! ```no_run
//! use vessel_leadtime::io::loaders::RecordLoader;
//! use std::path::Path;
//!
//! let result = RecordLoader::load_from_file(Path::new("data/vessel_reports.parquet"))
//!     .expect("Failed to load");
//! println!("Loaded {} reports", result.num_records);
//! ```

pub mod loaders;


pub use loaders::{
    assign_row_ids, reports_to_dataframe, RecordLoadResult, RecordLoader, RecordSourceType,
};
