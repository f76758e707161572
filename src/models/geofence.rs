//! Geofence check models for electronic visit verification.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns true if both coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// GPS accuracy classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccuracyLevel {
    /// Accuracy <= 10 m.
    Excellent,
    /// Accuracy <= 50 m.
    Good,
    /// Accuracy <= 100 m.
    Fair,
    /// Accuracy > 100 m.
    Poor,
    /// No usable accuracy value was captured.
    Unknown,
}

impl AccuracyLevel {
    /// Classifies an accuracy radius in meters.
    ///
    /// # Example
    ///
    /// ```
    /// use timesheet_engine::models::AccuracyLevel;
    ///
    /// assert_eq!(AccuracyLevel::from_meters(Some(10.0)), AccuracyLevel::Excellent);
    /// assert_eq!(AccuracyLevel::from_meters(Some(50.1)), AccuracyLevel::Fair);
    /// assert_eq!(AccuracyLevel::from_meters(None), AccuracyLevel::Unknown);
    /// ```
    pub fn from_meters(accuracy_meters: Option<f64>) -> Self {
        match accuracy_meters {
            Some(m) if !m.is_finite() || m < 0.0 => AccuracyLevel::Unknown,
            Some(m) if m <= 10.0 => AccuracyLevel::Excellent,
            Some(m) if m <= 50.0 => AccuracyLevel::Good,
            Some(m) if m <= 100.0 => AccuracyLevel::Fair,
            Some(_) => AccuracyLevel::Poor,
            None => AccuracyLevel::Unknown,
        }
    }
}

/// Why a geofence check failed closed without comparing distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceFailure {
    /// No employee position was captured.
    MissingEmployeePoint,
    /// No patient position is on file.
    MissingPatientPoint,
    /// The employee position is out of range or not a number.
    InvalidEmployeePoint,
    /// The patient position is out of range or not a number.
    InvalidPatientPoint,
    /// No accuracy value was captured.
    MissingAccuracy,
    /// The accuracy value is negative or not a number.
    InvalidAccuracy,
    /// The allowed radius is not a positive number.
    InvalidRadius,
}

impl fmt::Display for GeofenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            GeofenceFailure::MissingEmployeePoint => "employee location was not captured",
            GeofenceFailure::MissingPatientPoint => "patient location is not on file",
            GeofenceFailure::InvalidEmployeePoint => "employee location is out of range",
            GeofenceFailure::InvalidPatientPoint => "patient location is out of range",
            GeofenceFailure::MissingAccuracy => "location accuracy was not captured",
            GeofenceFailure::InvalidAccuracy => "location accuracy is invalid",
            GeofenceFailure::InvalidRadius => "allowed radius must be a positive number",
        };
        f.write_str(message)
    }
}

/// The result of one geofence validation.
///
/// Checks are never mutated. A radius-policy change produces a new check
/// and the old one is kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceCheck {
    /// Unique identifier for the check.
    pub id: Uuid,
    /// Where the employee was.
    pub employee_point: Option<GeoPoint>,
    /// Where the patient is.
    pub patient_point: Option<GeoPoint>,
    /// Great-circle distance in feet, when both points were usable.
    pub distance_feet: Option<f64>,
    /// The radius the visit had to fall within.
    pub allowed_radius_feet: f64,
    /// Reported GPS accuracy in meters.
    pub accuracy_meters: Option<f64>,
    /// Classification of `accuracy_meters`.
    pub accuracy_level: AccuracyLevel,
    /// Whether the visit passed.
    pub valid: bool,
    /// Set when the check failed closed on bad input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<GeofenceFailure>,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}
