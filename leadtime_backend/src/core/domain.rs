//! Domain models for vessel position reports.
//!
//! This module provides the typed view of a single tracking report together with
//! the column names the pipeline stages agree on. Stages operate on Polars
//! DataFrames; these structs are the typed entry point for callers that hold
//! reports in memory rather than in a columnar file.

use serde::{Deserialize, Serialize};

/// Column names shared across pipeline stages.
pub mod columns {
    /// Immutable row identifier assigned at load time.
    pub const ROW_ID: &str = "row_id";

    pub const EPOCH_MILLIS: &str = "epochMillis";
    pub const MMSI: &str = "mmsi";
    pub const NAVIGATION: &str = "navigation";
    pub const VESSEL_DETAILS: &str = "vesselDetails";

    pub const TIMESTAMP: &str = "timestamp";
    pub const LEAD_TIME: &str = "lead_time";

    pub const NAV_CODE: &str = "navCode";
    pub const NAV_DESC: &str = "navDesc";
    pub const COURSE_OVER_GROUND: &str = "courseOverGround";
    pub const SPEED_OVER_GROUND: &str = "speedOverGround";

    pub const TYPE_NAME: &str = "typeName";
    pub const VESSEL_NAME: &str = "name";

    /// Columns every raw input table must provide.
    pub const RAW_REQUIRED: [&str; 4] = [EPOCH_MILLIS, MMSI, NAVIGATION, VESSEL_DETAILS];

    /// Numeric feature columns, in output order.
    pub const NUMERIC_FEATURES: [&str; 2] = [COURSE_OVER_GROUND, SPEED_OVER_GROUND];

    /// Categorical feature columns, in output order.
    pub const CATEGORICAL_FEATURES: [&str; 2] = [NAV_DESC, TYPE_NAME];

    /// Columns produced by the detail merge, in order.
    pub const MERGED: [&str; 7] = [
        MMSI,
        TIMESTAMP,
        LEAD_TIME,
        TYPE_NAME,
        NAV_DESC,
        COURSE_OVER_GROUND,
        SPEED_OVER_GROUND,
    ];
}

/// Navigation block of a report.
///
/// Every field is optional: transponders omit values freely and the pipeline
/// treats an absent value as null rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDetail {
    pub nav_code: Option<i64>,
    pub nav_desc: Option<String>,
    pub course_over_ground: Option<f64>,
    pub speed_over_ground: Option<f64>,
}

/// Static vessel information attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselDetail {
    pub type_name: Option<String>,
    pub name: Option<String>,
}

/// A single vessel tracking report as it arrives from the feed.
///
/// Reports arrive in feed order, not time order.
///
/// # Examples
///
/// ```
/// use vessel_leadtime::core::domain::{NavigationDetail, VesselDetail, VesselReport};
///
/// let report = VesselReport::new(1_800_000, 244_123_000)
///     .with_navigation(NavigationDetail {
///         nav_code: Some(0),
///         nav_desc: Some("Under way using engine".to_string()),
///         course_over_ground: Some(91.5),
///         speed_over_ground: Some(12.3),
///     })
///     .with_vessel(VesselDetail {
///         type_name: Some("Cargo".to_string()),
///         name: None,
///     });
///
/// assert_eq!(report.epoch_minutes(), 30.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselReport {
    pub epoch_millis: i64,
    pub mmsi: i64,
    pub navigation: Option<NavigationDetail>,
    pub vessel_details: Option<VesselDetail>,
}

impl VesselReport {
    pub fn new(epoch_millis: i64, mmsi: i64) -> Self {
        Self {
            epoch_millis,
            mmsi,
            navigation: None,
            vessel_details: None,
        }
    }

    pub fn with_navigation(mut self, navigation: NavigationDetail) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_vessel(mut self, vessel_details: VesselDetail) -> Self {
        self.vessel_details = Some(vessel_details);
        self
    }

    /// Report time in minutes since the Unix epoch.
    pub fn epoch_minutes(&self) -> f64 {
        self.epoch_millis as f64 / MILLIS_PER_MINUTE
    }
}

/// Milliseconds in one minute; lead times are expressed in minutes.
pub const MILLIS_PER_MINUTE: f64 = 60_000.0;
