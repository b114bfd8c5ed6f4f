//! Raw record validation with detailed error and warning reporting.
//!
//! This module checks loaded vessel reports for the columns the pipeline needs
//! and for data quality issues (missing identifiers, missing nested blocks,
//! negative epochs and duplicated reports) before any stage runs.

use std::collections::HashSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::domain::columns::{EPOCH_MILLIS, MMSI, NAVIGATION, RAW_REQUIRED, VESSEL_DETAILS};
use crate::core::domain::VesselReport;

/// Number of individual issues listed before a summary line is emitted.
const MAX_LISTED_ISSUES: usize = 5;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false, while warnings are informational. Missing
/// required columns are additionally listed by name so the pipeline can report
/// them as schema errors.
///
/// # Examples
///
/// ```
/// use vessel_leadtime::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Missing required column: mmsi".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_columns: Vec<String>,
    pub invalid_columns: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
///
/// # Fields
///
/// * `total_records` - Number of reports validated
/// * `missing_epoch_millis` - Reports without a timestamp
/// * `missing_mmsi` - Reports without a vessel identifier
/// * `missing_navigation` - Reports whose navigation block is absent
/// * `missing_vessel_details` - Reports whose vessel block is absent
/// * `negative_epoch_millis` - Reports timestamped before 1970
/// * `duplicate_reports` - Reports repeating an earlier `(mmsi, epochMillis)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_records: usize,
    pub missing_epoch_millis: usize,
    pub missing_mmsi: usize,
    pub missing_navigation: usize,
    pub missing_vessel_details: usize,
    pub negative_epoch_millis: usize,
    pub duplicate_reports: usize,
}

impl ValidationResult {
    /// Creates a new validation result with valid status and no issues.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            missing_columns: Vec::new(),
            invalid_columns: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    ///
    /// ```
    /// use vessel_leadtime::preprocessing::validator::ValidationResult;
    ///
    /// let mut result = ValidationResult::new();
    /// result.add_warning("3 reports without navigation".to_string());
    /// assert!(result.is_valid);
    /// ```
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    fn add_missing_column(&mut self, column: &str) {
        self.missing_columns.push(column.to_string());
        self.add_error(format!("Missing required column: {}", column));
    }

    fn add_invalid_column(&mut self, column: &str, error: String) {
        self.invalid_columns.push(column.to_string());
        self.add_error(error);
    }

    /// First column named by an error, missing columns before mistyped ones.
    pub fn first_offending_column(&self) -> Option<&str> {
        self.missing_columns
            .iter()
            .chain(&self.invalid_columns)
            .next()
            .map(String::as_str)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for raw vessel reports.
///
/// Works on either the loaded DataFrame or typed [`VesselReport`] values. Data
/// quality issues are warnings: the pipeline stages define how nulls and
/// duplicates flow through. Only missing or mistyped required columns are
/// errors.
///
/// # Examples
///
/// ```no_run
/// use vessel_leadtime::preprocessing::validator::RecordValidator;
/// use polars::prelude::*;
///
/// # fn example(df: &DataFrame) {
/// let result = RecordValidator::validate_dataframe(df);
/// if !result.is_valid {
///     eprintln!("Validation failed: {:?}", result.errors);
/// }
/// println!("Validated {} reports", result.stats.total_records);
/// # }
/// ```
pub struct RecordValidator;

impl RecordValidator {
    /// Validates a raw report table.
    ///
    /// Requires columns: `epochMillis`, `mmsi`, `navigation`, `vesselDetails`.
    /// The nested columns must be structures and `epochMillis` an integer.
    pub fn validate_dataframe(df: &DataFrame) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_records = df.height();

        for column in RAW_REQUIRED {
            if df.column(column).is_err() {
                result.add_missing_column(column);
            }
        }
        if !result.is_valid {
            return result;
        }

        for column in [NAVIGATION, VESSEL_DETAILS] {
            if let Ok(nested) = df.column(column) {
                if !matches!(nested.dtype(), DataType::Struct(_)) {
                    let error = format!(
                        "Column {} must be a nested structure, found {}",
                        column,
                        nested.dtype()
                    );
                    result.add_invalid_column(column, error);
                }
            }
        }

        if let Ok(epoch) = df.column(EPOCH_MILLIS) {
            if !epoch.dtype().is_integer() && !epoch.dtype().is_null() {
                let error = format!(
                    "Column {} must hold integer milliseconds, found {}",
                    EPOCH_MILLIS,
                    epoch.dtype()
                );
                result.add_invalid_column(EPOCH_MILLIS, error);
            }
        }
        if !result.is_valid {
            return result;
        }

        result.stats.missing_epoch_millis = Self::null_count(df, EPOCH_MILLIS);
        result.stats.missing_mmsi = Self::null_count(df, MMSI);
        result.stats.missing_navigation = Self::null_count(df, NAVIGATION);
        result.stats.missing_vessel_details = Self::null_count(df, VESSEL_DETAILS);

        let epochs: Vec<Option<i64>> = df
            .column(EPOCH_MILLIS)
            .and_then(|c| c.cast(&DataType::Int64))
            .ok()
            .and_then(|c| c.i64().ok().map(|ca| ca.into_iter().collect()))
            .unwrap_or_default();
        let vessels: Vec<Option<String>> = df
            .column(MMSI)
            .and_then(|c| c.cast(&DataType::String))
            .ok()
            .and_then(|c| {
                c.str()
                    .ok()
                    .map(|ca| ca.into_iter().map(|v| v.map(str::to_string)).collect())
            })
            .unwrap_or_default();

        let negatives = epochs.iter().flatten().filter(|&&ms| ms < 0).count();
        result.stats.negative_epoch_millis = negatives;

        let keys = vessels
            .into_iter()
            .zip(epochs)
            .filter_map(|(vessel, epoch)| Some((vessel?, epoch?)));
        result.stats.duplicate_reports = Self::check_duplicates(keys, &mut result);

        Self::summarize(&mut result);
        result
    }

    /// Validates typed reports.
    ///
    /// ```
    /// use vessel_leadtime::core::domain::VesselReport;
    /// use vessel_leadtime::preprocessing::validator::RecordValidator;
    ///
    /// let reports = vec![VesselReport::new(0, 1), VesselReport::new(0, 1)];
    /// let result = RecordValidator::validate_reports(&reports);
    /// assert_eq!(result.stats.duplicate_reports, 1);
    /// assert_eq!(result.stats.missing_navigation, 2);
    /// ```
    pub fn validate_reports(reports: &[VesselReport]) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_records = reports.len();

        for report in reports {
            if report.navigation.is_none() {
                result.stats.missing_navigation += 1;
            }
            if report.vessel_details.is_none() {
                result.stats.missing_vessel_details += 1;
            }
            if report.epoch_millis < 0 {
                result.stats.negative_epoch_millis += 1;
            }
        }

        let keys = reports
            .iter()
            .map(|report| (report.mmsi.to_string(), report.epoch_millis));
        result.stats.duplicate_reports = Self::check_duplicates(keys, &mut result);

        Self::summarize(&mut result);
        result
    }

    fn null_count(df: &DataFrame, column: &str) -> usize {
        df.column(column).map(|c| c.null_count()).unwrap_or(0)
    }

    fn check_duplicates(
        keys: impl Iterator<Item = (String, i64)>,
        result: &mut ValidationResult,
    ) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = 0;

        for (vessel, epoch) in keys {
            if !seen.insert((vessel.clone(), epoch)) {
                duplicates += 1;
                if duplicates <= MAX_LISTED_ISSUES {
                    result.add_warning(format!(
                        "Duplicate report for vessel {} at {} ms",
                        vessel, epoch
                    ));
                }
            }
        }

        if duplicates > MAX_LISTED_ISSUES {
            result.add_warning(format!(
                "Total duplicate reports: {} (showing first {})",
                duplicates, MAX_LISTED_ISSUES
            ));
        }

        duplicates
    }

    fn summarize(result: &mut ValidationResult) {
        let stats = result.stats.clone();
        let counts = [
            (stats.missing_epoch_millis, "without epochMillis"),
            (stats.missing_mmsi, "without mmsi"),
            (stats.missing_navigation, "without navigation details"),
            (stats.missing_vessel_details, "without vessel details"),
            (stats.negative_epoch_millis, "with a negative epochMillis"),
        ];
        for (count, what) in counts {
            if count > 0 {
                result.add_warning(format!("{} reports {}", count, what));
            }
        }
    }
}
