//! Core data models for the Timesheet Normalization Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod correction;
mod employee;
mod geofence;
mod resolved_date;
mod resolved_time;
mod time_entry;
mod timesheet;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use correction::{CorrectionScope, NameCorrectionRecord};
pub use employee::{
    CanonicalEmployee, EmployeeEntry, EmployeeSuggestion, HIGH_CONFIDENCE_THRESHOLD,
    MIN_SIMILARITY, MatchConfidence, PROBABLE_THRESHOLD, name_key,
};
pub use geofence::{AccuracyLevel, GeoPoint, GeofenceCheck, GeofenceFailure};
pub use resolved_date::{DateAmbiguity, DateContext, ResolvedDate};
pub use resolved_time::ResolvedTime;
pub use time_entry::TimeEntry;
pub use timesheet::{RawEmployeeLine, RawTimeLine, RawTimesheet, RejectedLine, Timesheet};
