//! Error types for the Timesheet Normalization Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the hard-fail paths of the engine. Soft-fail components (date
//! resolution, service-code lookup, accuracy classification) never produce
//! these errors; they return structured "unresolved" values instead.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for the Timesheet Normalization Engine.
///
/// # Example
///
/// ```
/// use timesheet_engine::error::EngineError;
///
/// let error = EngineError::UnrecognizedTime {
///     field: "time_in".to_string(),
///     raw: "??".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unrecognized time in field 'time_in': '??'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A clock time could not be recognized and cannot be defaulted.
    #[error("Unrecognized time in field '{field}': '{raw}'")]
    UnrecognizedTime {
        /// The field the value came from (e.g. "time_in").
        field: String,
        /// The raw extracted value.
        raw: String,
    },

    /// An employee name was empty or otherwise unusable.
    #[error("Invalid employee name '{name}': {message}")]
    InvalidEmployeeName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        message: String,
    },

    /// No employee with this id exists in the organization's roster.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The requested employee id.
        employee_id: String,
    },

    /// No timesheet with this id exists for the organization.
    #[error("Timesheet '{timesheet_id}' not found for organization '{organization_id}'")]
    TimesheetNotFound {
        /// The organization the lookup was scoped to.
        organization_id: String,
        /// The requested timesheet id.
        timesheet_id: Uuid,
    },

    /// A timesheet with this id has already been stored.
    #[error("Timesheet '{timesheet_id}' already exists")]
    DuplicateTimesheet {
        /// The conflicting timesheet id.
        timesheet_id: Uuid,
    },

    /// An edit was made against a stale version of a timesheet.
    #[error(
        "Version conflict on timesheet '{timesheet_id}': expected version {expected}, found {actual}"
    )]
    VersionConflict {
        /// The timesheet being edited.
        timesheet_id: Uuid,
        /// The version the editor last read.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// A reviewer edit referenced a line that does not exist or was malformed.
    #[error("Invalid edit: {message}")]
    InvalidEdit {
        /// A description of what made the edit invalid.
        message: String,
    },

    /// A name correction request was malformed.
    #[error("Invalid correction: {message}")]
    InvalidCorrection {
        /// A description of what made the correction invalid.
        message: String,
    },

    /// A bulk name correction stopped part-way through.
    ///
    /// `updated_count` is the exact number of employee entries rewritten
    /// before the failure, so a caller can tell this apart from a correction
    /// that matched nothing.
    #[error("Name correction partially applied ({updated_count} records updated): {message}")]
    PartialCorrection {
        /// Records successfully rewritten before the failure.
        updated_count: usize,
        /// The underlying failure.
        message: String,
    },

    /// The storage layer failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/engine.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_version_conflict_displays_versions() {
        let id = Uuid::nil();
        let error = EngineError::VersionConflict {
            timesheet_id: id,
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            error.to_string(),
            format!("Version conflict on timesheet '{id}': expected version 2, found 3")
        );
    }

    #[test]
    fn test_partial_correction_reports_count() {
        let error = EngineError::PartialCorrection {
            updated_count: 4,
            message: "store unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Name correction partially applied (4 records updated): store unavailable"
        );
    }

    #[test]
    fn test_timesheet_not_found_displays_scope() {
        let error = EngineError::TimesheetNotFound {
            organization_id: "org_a".to_string(),
            timesheet_id: Uuid::nil(),
        };
        assert!(error.to_string().contains("org_a"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unrecognized_time() -> EngineResult<()> {
            Err(EngineError::UnrecognizedTime {
                field: "time_out".to_string(),
                raw: "xx".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unrecognized_time()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
