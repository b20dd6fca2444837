//! Input Loader: turns a `SolveRequest` into a dense `SolveContext`.

use crate::conflict;
use crate::domain::{Availability, SolveContext, SolveRequest};
use crate::error::SolveError;
use crate::store::MemoryStore;

/// Build the dense problem instance for one solve run. Fails fast with one
/// of the input-empty kinds before any modeling work starts.
pub fn build_context(
    store: &MemoryStore,
    request: SolveRequest,
) -> Result<SolveContext, SolveError> {
    log::info!(
        "loading context for career={} term={} period={}",
        request.career_id,
        request.term_index,
        request.academic_period
    );

    let instructors = store.active_instructors_for_career(request.career_id)?;
    if instructors.is_empty() {
        return Err(SolveError::NoInstructors);
    }

    let courses = store.courses_for_career_term(request.career_id, request.term_index)?;
    if courses.is_empty() {
        return Err(SolveError::NoCourses);
    }

    let slots = store.slots_for_shift(request.shift)?;
    if slots.is_empty() {
        return Err(SolveError::NoSlots);
    }

    let instructor_ids: Vec<_> = instructors.iter().map(|i| i.id).collect();
    let availability: Availability = store.availability_for(&instructor_ids)?;

    let blackouts = conflict::compute_blackouts(store, &request, &instructor_ids)?;

    log::info!(
        "loaded {} instructors, {} courses, {} slots",
        instructors.len(),
        courses.len(),
        slots.len()
    );

    Ok(SolveContext {
        request,
        instructors,
        courses,
        slots,
        availability,
        blackouts,
    })
}
