//! HTTP API module for the Timesheet Normalization Engine.
//!
//! This module exposes the resolvers, the timesheet pipeline, reviewer
//! edits, employee search and name correction as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    CreateTimesheetRequest, DurationRequest, EditTimesheetRequest, EmployeeSearchRequest,
    GeofenceRequest, NameCorrectionRequest, ResolveDateRequest, ResolveTimeRequest,
    ServiceCodesRequest,
};
pub use response::{ApiError, ApiErrorResponse, ResolveDateResponse};
pub use state::AppState;
