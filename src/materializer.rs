//! Materializer: deactivates every prior Assignment row for the same
//! (academic_period, career) and writes the new set as one atomic operation,
//! then assembles the SolveReport. Grounded on the original generator's
//! `interpretar_solucion` (bulk-deactivate before insert, commit) and
//! `obtener_estadisticas` (coverage percentage).

use crate::domain::{Algorithm, Assignment, SolveContext, SolveCounts, SolveReport};
use crate::error::SolveError;
use crate::store::MemoryStore;
use std::collections::HashSet;

pub fn materialize(
    store: &MemoryStore,
    ctx: &SolveContext,
    algorithm: Algorithm,
    assignments: Vec<Assignment>,
) -> Result<SolveReport, SolveError> {
    let counts = compute_counts(ctx, &assignments);

    store
        .deactivate_and_insert(
            &ctx.request.academic_period,
            ctx.request.career_id,
            ctx.request.submitter_id,
            assignments.clone(),
        )
        .map_err(|e| SolveError::Persistence(e.to_string()))?;

    log::info!(
        "materialized {} assignments via {:?} ({} distinct courses, {:.1}% coverage)",
        counts.total_assignments,
        algorithm,
        counts.distinct_courses,
        counts.course_coverage_percent
    );

    Ok(SolveReport {
        success: true,
        message: format!(
            "generated {} assignments covering {} of {} courses",
            counts.total_assignments,
            counts.distinct_courses,
            ctx.courses.len()
        ),
        algorithm: Some(algorithm),
        counts,
        assignments,
    })
}

fn compute_counts(ctx: &SolveContext, assignments: &[Assignment]) -> SolveCounts {
    let distinct_instructors: HashSet<_> = assignments.iter().map(|a| a.instructor_id).collect();
    let distinct_courses: HashSet<_> = assignments.iter().map(|a| a.course_id).collect();
    let coverage = if ctx.courses.is_empty() {
        0.0
    } else {
        (distinct_courses.len() as f64 / ctx.courses.len() as f64) * 100.0
    };

    SolveCounts {
        total_assignments: assignments.len(),
        distinct_instructors: distinct_instructors.len(),
        distinct_courses: distinct_courses.len(),
        course_coverage_percent: coverage,
    }
}
