//! Geofence validation for electronic visit verification.
//!
//! Distances use the haversine formula on a spherical Earth. Validation
//! fails closed: any missing or out-of-range input produces a check with
//! `valid = false` and the reason in `failure`, never a pass.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{AccuracyLevel, GeoPoint, GeofenceCheck, GeofenceFailure};

/// Mean Earth radius used for distance calculation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.28084;

/// Great-circle distance between two points, in feet.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::GeoPoint;
/// use timesheet_engine::normalization::haversine_feet;
///
/// let p = GeoPoint { latitude: 40.0, longitude: -74.0 };
/// assert_eq!(haversine_feet(&p, &p), 0.0);
/// ```
pub fn haversine_feet(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c * FEET_PER_METER
}

/// Validates that a visit was performed within `allowed_radius_feet` of the
/// patient.
pub fn validate_geofence(
    employee_point: Option<GeoPoint>,
    patient_point: Option<GeoPoint>,
    accuracy_meters: Option<f64>,
    allowed_radius_feet: f64,
) -> GeofenceCheck {
    let usable = |point: Option<GeoPoint>| point.filter(GeoPoint::is_valid);
    let distance_feet = match (usable(employee_point), usable(patient_point)) {
        (Some(employee), Some(patient)) => Some(haversine_feet(&employee, &patient)),
        _ => None,
    };

    let failure = input_failure(
        employee_point,
        patient_point,
        accuracy_meters,
        allowed_radius_feet,
    );

    let valid = match (failure, distance_feet) {
        (None, Some(distance)) => distance <= allowed_radius_feet,
        _ => false,
    };

    GeofenceCheck {
        id: Uuid::new_v4(),
        employee_point,
        patient_point,
        distance_feet,
        allowed_radius_feet,
        accuracy_meters,
        accuracy_level: AccuracyLevel::from_meters(accuracy_meters),
        valid,
        failure,
        checked_at: Utc::now(),
    }
}

/// Re-runs a check under a new radius policy.
///
/// The original check is left untouched; the caller keeps both.
pub fn revalidate(check: &GeofenceCheck, allowed_radius_feet: f64) -> GeofenceCheck {
    validate_geofence(
        check.employee_point,
        check.patient_point,
        check.accuracy_meters,
        allowed_radius_feet,
    )
}

fn input_failure(
    employee_point: Option<GeoPoint>,
    patient_point: Option<GeoPoint>,
    accuracy_meters: Option<f64>,
    allowed_radius_feet: f64,
) -> Option<GeofenceFailure> {
    match employee_point {
        None => return Some(GeofenceFailure::MissingEmployeePoint),
        Some(point) if !point.is_valid() => return Some(GeofenceFailure::InvalidEmployeePoint),
        _ => {}
    }
    match patient_point {
        None => return Some(GeofenceFailure::MissingPatientPoint),
        Some(point) if !point.is_valid() => return Some(GeofenceFailure::InvalidPatientPoint),
        _ => {}
    }
    match accuracy_meters {
        None => return Some(GeofenceFailure::MissingAccuracy),
        Some(m) if !m.is_finite() || m < 0.0 => return Some(GeofenceFailure::InvalidAccuracy),
        _ => {}
    }
    if !allowed_radius_feet.is_finite() || allowed_radius_feet <= 0.0 {
        return Some(GeofenceFailure::InvalidRadius);
    }
    None
}
