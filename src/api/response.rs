//! Response types for the Timesheet Normalization Engine API.
//!
//! This module defines the error response structures and the mapping from
//! [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::ResolvedDate;
use crate::normalization::DateRule;

/// Response body for `POST /dates/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveDateResponse {
    /// The canonicalized date.
    #[serde(flatten)]
    pub date: ResolvedDate,
    /// The rule that produced it.
    pub rule: DateRule,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Records rewritten before a partial correction failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_count: Option<usize>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            updated_count: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(code, message)
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a response from a status and body.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
            EngineError::UnrecognizedTime { field, .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "UNRECOGNIZED_TIME",
                    message,
                    format!("Enter the value of '{}' manually", field),
                ),
            ),
            EngineError::InvalidEmployeeName { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_EMPLOYEE_NAME", message),
            ),
            EngineError::EmployeeNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("EMPLOYEE_NOT_FOUND", message),
            ),
            EngineError::TimesheetNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("TIMESHEET_NOT_FOUND", message),
            ),
            EngineError::DuplicateTimesheet { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::new("DUPLICATE_TIMESHEET", message),
            ),
            EngineError::VersionConflict { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "VERSION_CONFLICT",
                    message,
                    "Reload the timesheet and reapply the edit",
                ),
            ),
            EngineError::InvalidEdit { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_EDIT", message),
            ),
            EngineError::InvalidCorrection { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_CORRECTION", message),
            ),
            EngineError::PartialCorrection { updated_count, .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError {
                    updated_count: Some(updated_count),
                    ..ApiError::with_details(
                        "PARTIAL_CORRECTION",
                        message,
                        "Retry the correction to resume",
                    )
                },
            ),
            EngineError::Storage { .. } => ApiErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("STORAGE_ERROR", message),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
        assert!(!json.contains("updated_count"));
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_unrecognized_time_is_unprocessable() {
        let response: ApiErrorResponse = EngineError::UnrecognizedTime {
            field: "time_in".to_string(),
            raw: "??".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.code, "UNRECOGNIZED_TIME");
    }

    #[test]
    fn test_version_conflict_is_conflict() {
        let response: ApiErrorResponse = EngineError::VersionConflict {
            timesheet_id: Uuid::nil(),
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error.code, "VERSION_CONFLICT");
    }

    #[test]
    fn test_partial_correction_carries_count() {
        let response: ApiErrorResponse = EngineError::PartialCorrection {
            updated_count: 3,
            message: "store unavailable".to_string(),
        }
        .into();
        assert_eq!(response.error.updated_count, Some(3));
        let json = serde_json::to_string(&response.error).unwrap();
        assert!(json.contains("\"updated_count\":3"));
    }
}
