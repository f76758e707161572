//! HTTP request handlers for the Timesheet Normalization Engine API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! request gets a correlation id that is attached to its log lines.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{DateContext, GeofenceCheck};
use crate::normalization::{apply_edit, compute_duration_with_policy, validate_geofence};

use super::request::{
    CreateTimesheetRequest, DurationRequest, EditTimesheetRequest, EmployeeSearchRequest,
    GeofenceRequest, NameCorrectionRequest, ResolveDateRequest, ResolveTimeRequest,
    ServiceCodesRequest,
};
use super::response::{ApiError, ApiErrorResponse, ResolveDateResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/dates/resolve", post(resolve_date_handler))
        .route("/times/resolve", post(resolve_time_handler))
        .route("/durations", post(duration_handler))
        .route("/timesheets", post(create_timesheet_handler))
        .route(
            "/organizations/:organization_id/timesheets/:timesheet_id",
            get(get_timesheet_handler),
        )
        .route(
            "/organizations/:organization_id/timesheets/:timesheet_id/edits",
            post(edit_timesheet_handler),
        )
        .route("/employees/search", post(search_employees_handler))
        .route("/employees/corrections", post(correction_handler))
        .route("/service-codes", post(service_codes_handler))
        .route("/geofence/validate", post(geofence_handler))
        .with_state(state)
}

/// Serializes a successful response body.
fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Logs an engine failure and maps it to its HTTP response.
fn engine_error_response(correlation_id: Uuid, error: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %error,
        "Request failed"
    );
    let api_error: ApiErrorResponse = error.into();
    json_response(api_error.status, api_error.error)
}

fn validation_response(correlation_id: Uuid, message: &str) -> Response {
    warn!(correlation_id = %correlation_id, error = message, "Validation failed");
    json_response(StatusCode::BAD_REQUEST, ApiError::validation_error(message))
}

/// Unwraps a JSON body or builds the 400 response for a rejected one.
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    Err(json_response(StatusCode::BAD_REQUEST, error))
}

/// Handler for POST /dates/resolve.
///
/// Always answers 200; an unresolvable date comes back with its ambiguity
/// set rather than as an error.
async fn resolve_date_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResolveDateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (date, rule) = state
        .normalizer()
        .dates()
        .resolve_with_rule(&request.raw, &request.context());
    info!(
        correlation_id = %correlation_id,
        rule = rule.rule_id(),
        ambiguity = ?date.ambiguity,
        "Date resolved"
    );

    json_response(StatusCode::OK, ResolveDateResponse { date, rule })
}

/// Handler for POST /times/resolve.
async fn resolve_time_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResolveTimeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.normalizer().times().resolve_detailed(&request.raw) {
        Some(resolution) => {
            info!(
                correlation_id = %correlation_id,
                time = %resolution.time.canonical(),
                corrected = resolution.time.corrected,
                "Time resolved"
            );
            json_response(StatusCode::OK, resolution)
        }
        None => engine_error_response(
            correlation_id,
            EngineError::UnrecognizedTime {
                field: "raw".to_string(),
                raw: request.raw,
            },
        ),
    }
}

/// Handler for POST /durations.
async fn duration_handler(
    State(state): State<AppState>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let normalizer = state.normalizer();
    let times = normalizer.times();
    let resolved = times
        .require(&request.time_in, "time_in")
        .and_then(|time_in| {
            times
                .require(&request.time_out, "time_out")
                .map(|time_out| (time_in, time_out))
        });
    let (time_in, time_out) = match resolved {
        Ok(pair) => pair,
        Err(err) => return engine_error_response(correlation_id, err),
    };

    let duration = compute_duration_with_policy(&time_in, &time_out, normalizer.durations());
    info!(
        correlation_id = %correlation_id,
        minutes_worked = duration.minutes_worked,
        units = duration.units,
        overnight = duration.overnight,
        "Duration computed"
    );

    json_response(StatusCode::OK, duration)
}

/// Handler for POST /timesheets.
///
/// Normalizes an extracted timesheet and stores it at version 1.
async fn create_timesheet_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateTimesheetRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing timesheet");

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.organization_id.trim().is_empty() {
        return validation_response(correlation_id, "organization_id must not be empty");
    }

    let start_time = Instant::now();
    let index = state.index_for(&request.organization_id);
    let context = DateContext {
        week_start: request.week_start,
    };
    let stored = state
        .normalizer()
        .normalize_timesheet(&request.timesheet, &context, &index)
        .and_then(|timesheet| state.store().insert(timesheet));

    match stored {
        Ok(timesheet) => {
            info!(
                correlation_id = %correlation_id,
                organization_id = %timesheet.organization_id,
                timesheet_id = %timesheet.id,
                requires_review = timesheet.requires_review(),
                duration_us = start_time.elapsed().as_micros(),
                "Timesheet stored"
            );
            json_response(StatusCode::CREATED, timesheet)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for GET /organizations/:organization_id/timesheets/:timesheet_id.
async fn get_timesheet_handler(
    State(state): State<AppState>,
    Path((organization_id, timesheet_id)): Path<(String, Uuid)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.store().get(&organization_id, timesheet_id) {
        Ok(timesheet) => json_response(StatusCode::OK, timesheet),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /organizations/:organization_id/timesheets/:timesheet_id/edits.
///
/// Answers 409 when `expected_version` is stale.
async fn edit_timesheet_handler(
    State(state): State<AppState>,
    Path((organization_id, timesheet_id)): Path<(String, Uuid)>,
    payload: Result<Json<EditTimesheetRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let index = state.index_for(&organization_id);
    let context = DateContext {
        week_start: request.week_start,
    };
    let result = apply_edit(
        state.store(),
        state.normalizer(),
        &index,
        timesheet_id,
        request.expected_version,
        request.edit,
        &context,
    );

    match result {
        Ok(timesheet) => {
            info!(
                correlation_id = %correlation_id,
                timesheet_id = %timesheet.id,
                version = timesheet.version,
                "Edit applied"
            );
            json_response(StatusCode::OK, timesheet)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /employees/search.
async fn search_employees_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeSearchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let matches = state
        .index_for(&request.organization_id)
        .search(&request.partial_name, request.limit);
    info!(
        correlation_id = %correlation_id,
        organization_id = %request.organization_id,
        matches = matches.len(),
        "Employee search completed"
    );

    json_response(StatusCode::OK, matches)
}

/// Handler for POST /employees/corrections.
///
/// A correction that stops part-way answers with `updated_count` set so the
/// caller can retry.
async fn correction_handler(
    State(state): State<AppState>,
    payload: Result<Json<NameCorrectionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = state.index_for(&request.organization_id).apply_correction(
        &request.incorrect_name,
        &request.correct_name,
        request.scope,
    );

    match result {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                organization_id = %request.organization_id,
                employee_id = %outcome.employee.id,
                updated_count = outcome.updated_count,
                "Name correction applied"
            );
            json_response(StatusCode::OK, outcome)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /service-codes.
///
/// An unknown or absent employee gets the default catalog.
async fn service_codes_handler(
    State(state): State<AppState>,
    payload: Result<Json<ServiceCodesRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let employee = request
        .employee_id
        .as_deref()
        .and_then(|id| state.index_for(&request.organization_id).get(id));
    let codes = state.normalizer().service_codes().codes_for(employee.as_ref());

    json_response(StatusCode::OK, codes)
}

/// Handler for POST /geofence/validate.
///
/// Always answers 200; a failed check is reported in the body.
async fn geofence_handler(
    State(state): State<AppState>,
    payload: Result<Json<GeofenceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let allowed_radius_feet = request
        .allowed_radius_feet
        .unwrap_or(state.config().geofence().default_allowed_radius_feet);
    let check: GeofenceCheck = validate_geofence(
        request.employee_point,
        request.patient_point,
        request.accuracy_meters,
        allowed_radius_feet,
    );
    info!(
        correlation_id = %correlation_id,
        valid = check.valid,
        distance_feet = ?check.distance_feet,
        failure = ?check.failure,
        "Geofence validated"
    );

    json_response(StatusCode::OK, check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::ConfigLoader;

    fn create_test_state() -> AppState {
        AppState::new(ConfigLoader::default())
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) = post_json(router, "/times/resolve", "{invalid json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = post_json(router, "/durations", r#"{"time_in": "9am"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unrecognized_time_returns_422() {
        let router = create_router(create_test_state());
        let body = json!({ "raw": "lunch" }).to_string();
        let (status, body) = post_json(router, "/times/resolve", &body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "UNRECOGNIZED_TIME");
    }

    #[tokio::test]
    async fn test_duration_reports_which_field_failed() {
        let router = create_router(create_test_state());
        let body = json!({ "time_in": "9:00am", "time_out": "??" }).to_string();
        let (status, body) = post_json(router, "/durations", &body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("time_out"));
    }

    #[tokio::test]
    async fn test_empty_organization_is_rejected() {
        let router = create_router(create_test_state());
        let body = json!({ "organization_id": " ", "timesheet": { "employees": [] } }).to_string();
        let (status, body) = post_json(router, "/timesheets", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
