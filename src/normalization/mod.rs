//! Normalization of raw extracted timesheet fields.
//!
//! This module contains the stateless resolvers (dates, clock times,
//! durations, service codes, geofence checks), the pipeline that applies
//! them to a whole raw timesheet, and reviewer edits against stored
//! timesheets.

mod date_resolver;
mod duration;
mod geofence;
mod review;
mod service_codes;
mod time_resolver;
mod timesheet;

pub use date_resolver::{DateResolver, DateRule, resolve_date};
pub use duration::{
    DurationResult, billing_units, build_time_entry, compute_duration,
    compute_duration_with_policy,
};
pub use geofence::{
    EARTH_RADIUS_METERS, FEET_PER_METER, haversine_feet, revalidate, validate_geofence,
};
pub use review::{TimesheetEdit, apply_edit};
pub use service_codes::{ServiceCode, ServiceCodeResolver};
pub use time_resolver::{MeridiemSource, TimeRepair, TimeResolution, TimeResolver, resolve_time};
pub use timesheet::Normalizer;
