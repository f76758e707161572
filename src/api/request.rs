//! Request types for the Timesheet Normalization Engine API.
//!
//! This module defines the JSON request bodies accepted by each endpoint.
//! Responses reuse the domain types directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CorrectionScope, DateContext, GeoPoint, RawTimesheet};
use crate::normalization::TimesheetEdit;

/// Request body for `POST /dates/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveDateRequest {
    /// The raw date text.
    pub raw: String,
    /// First day of the timesheet's week, used for weekday-only dates.
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
}

impl ResolveDateRequest {
    /// The resolution context carried by this request.
    pub fn context(&self) -> DateContext {
        DateContext {
            week_start: self.week_start,
        }
    }
}

/// Request body for `POST /times/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveTimeRequest {
    /// The raw clock time text.
    pub raw: String,
}

/// Request body for `POST /durations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationRequest {
    /// Raw clock-in text.
    pub time_in: String,
    /// Raw clock-out text.
    pub time_out: String,
}

/// Request body for `POST /timesheets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimesheetRequest {
    /// The owning organization.
    pub organization_id: String,
    /// First day of the week the timesheet covers.
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
    /// The extracted timesheet.
    pub timesheet: RawTimesheet,
}

/// Request body for `POST /organizations/:organization_id/timesheets/:timesheet_id/edits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTimesheetRequest {
    /// The version the reviewer last read.
    pub expected_version: u64,
    /// First day of the week, used when a date edit is weekday-only.
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
    /// The change to apply.
    pub edit: TimesheetEdit,
}

/// Request body for `POST /employees/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSearchRequest {
    /// The organization whose roster is searched.
    pub organization_id: String,
    /// The partial or misspelled name.
    pub partial_name: String,
    /// Maximum number of matches; the configured default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Request body for `POST /employees/corrections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameCorrectionRequest {
    /// The organization whose timesheets are rewritten.
    pub organization_id: String,
    /// The name as it was extracted.
    pub incorrect_name: String,
    /// The name it should have been.
    pub correct_name: String,
    /// Which timesheets to rewrite; all of them when absent.
    #[serde(default)]
    pub scope: CorrectionScope,
}

/// Request body for `POST /service-codes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCodesRequest {
    /// The organization the employee belongs to.
    pub organization_id: String,
    /// The employee whose qualified codes are wanted.
    #[serde(default)]
    pub employee_id: Option<String>,
}

/// Request body for `POST /geofence/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceRequest {
    /// Where the employee checked in.
    #[serde(default)]
    pub employee_point: Option<GeoPoint>,
    /// The patient's address.
    #[serde(default)]
    pub patient_point: Option<GeoPoint>,
    /// Reported GPS accuracy in meters.
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
    /// Allowed distance in feet; the configured default when absent.
    #[serde(default)]
    pub allowed_radius_feet: Option<f64>,
}
