//! HTTP presentation edge: a single route running the full orchestrator,
//! generalized from the teacher's direct `solver::solve` call. The
//! persistence layer proper is an external collaborator (§1 non-goals), so
//! this edge accepts a self-contained scenario payload, seeds an in-process
//! `MemoryStore` from it, and runs the orchestrator against that store —
//! the same shape as the teacher's request-carries-the-whole-instance model,
//! now routed through the Input Loader / Conflict Oracle / Materializer
//! instead of calling the solver directly.

use std::sync::Arc;

use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tower::limit::ConcurrencyLimitLayer;

use crate::config::AppConfig;
use crate::domain::{
    Assignment, Career, Course, Instructor, InstructorId, SlotId, SolveReport, SolveRequest,
    TimeSlot, Weekday,
};
use crate::error::SolveError;
use crate::orchestrator;
use crate::store::MemoryStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCellPayload {
    pub instructor_id: InstructorId,
    pub weekday: Weekday,
    pub slot_id: SlotId,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAssignmentPayload {
    pub assignment: Assignment,
    pub created_by: u32,
}

/// The whole problem instance plus the run's request, submitted in one
/// request body since a real external database is not wired up here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPayload {
    pub request: SolveRequest,
    #[serde(default)]
    pub careers: Vec<Career>,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
    pub slots: Vec<TimeSlot>,
    #[serde(default)]
    pub availability: Vec<AvailabilityCellPayload>,
    #[serde(default)]
    pub existing_assignments: Vec<ExistingAssignmentPayload>,
}

fn build_store(payload: &ScenarioPayload) -> MemoryStore {
    let store = MemoryStore::new();
    for career in &payload.careers {
        store.add_career(career.clone());
    }
    for instructor in &payload.instructors {
        store.add_instructor(instructor.clone());
    }
    for course in &payload.courses {
        store.add_course(course.clone());
    }
    for slot in &payload.slots {
        store.add_slot(slot.clone());
    }
    for cell in &payload.availability {
        store.set_availability(cell.instructor_id, cell.weekday, cell.slot_id, cell.available);
    }
    for existing in &payload.existing_assignments {
        store.seed_assignment(existing.assignment.clone(), existing.created_by);
    }
    store
}

/// Input-empty and persistence failures come back from the orchestrator as
/// `Err(SolveError)` and fall through axum's blanket `IntoResponse` dispatch
/// to carry the real HTTP status (422, 500); every other outcome is reported
/// in-band inside the `Ok(SolveReport)` body with HTTP 200.
async fn solve_handler(
    axum::extract::State(config): axum::extract::State<Arc<AppConfig>>,
    Json(payload): Json<ScenarioPayload>,
) -> Result<Json<SolveReport>, SolveError> {
    let report = tokio::task::spawn_blocking(move || {
        let store = build_store(&payload);
        orchestrator::solve(&store, payload.request, config.as_ref())
    })
    .await
    .map_err(|e| SolveError::Persistence(format!("solver task panicked: {e}")))??;

    Ok(Json(report))
}

/// Bounds concurrent solve requests to the configured MILP worker count, so
/// a burst of requests cannot oversubscribe the same CPU budget the primary
/// engine's own internal search workers already compete for.
pub fn build_router(config: AppConfig) -> Router {
    let worker_count = config.solver_worker_count.max(1);
    Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .layer(ConcurrencyLimitLayer::new(worker_count))
        .with_state(Arc::new(config))
}

pub async fn run_server(config: AppConfig) {
    let bind_address = config.bind_address.clone();
    let app = build_router(config);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_address}: {e}"));

    log::info!("server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
