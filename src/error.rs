//! Error taxonomy for the solver core, with an HTTP status mapping at the
//! presentation edge. The teacher returns bare `Result<T, String>`; the spec's
//! error taxonomy (input-empty, infeasible, timeout, unsatisfiable,
//! persistence, cancelled) needs named, matchable kinds. `engine-unavailable`
//! (§7) has no corresponding variant here: it is modeled structurally, by
//! `AppConfig::fallback_only` routing a run straight to the greedy fallback
//! before the primary engine is ever invoked (see orchestrator.rs), so there
//! is never a value of this type to construct for it.
//!
//! Only the Input Loader's and the Materializer's errors reach the HTTP edge
//! as a non-200 response (see server.rs): those are infrastructure failures
//! (no instance to solve, or a failed write). Every other kind is a genuine
//! solver outcome and is reported in-band as a `SolveReport` with
//! `success: false`, per §7's "the caller receives a structured report."

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("no instructors available for this request")]
    NoInstructors,

    #[error("no courses available for this request")]
    NoCourses,

    #[error("no time slots available for this request")]
    NoSlots,

    #[error("primary solver reported infeasible within budget")]
    Infeasible,

    #[error("primary solver exceeded its wall-clock budget")]
    Timeout,

    #[error("no valid assignment could be produced by either solver")]
    Unsatisfiable,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("solve run was cancelled")]
    Cancelled,
}

impl SolveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SolveError::NoInstructors | SolveError::NoCourses | SolveError::NoSlots => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SolveError::Infeasible | SolveError::Unsatisfiable => StatusCode::UNPROCESSABLE_ENTITY,
            SolveError::Timeout => StatusCode::REQUEST_TIMEOUT,
            SolveError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SolveError::Cancelled => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for SolveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(self, SolveError::Persistence(_)) {
            log::error!("persistence error: {self}");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
