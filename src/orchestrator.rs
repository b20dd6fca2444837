//! Sequences the six components into one solve run and enforces the §4.7
//! state machine: created -> loaded -> modeled -> solved|fallback ->
//! materialized|failed. `solved -> fallback` is not a legal transition;
//! fallback is only entered directly from `loaded` (engine preference/absence)
//! or after `modeled` (primary engine failure).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::AppConfig;
use crate::domain::{Algorithm, SolveReport, SolveRequest};
use crate::error::SolveError;
use crate::store::MemoryStore;
use crate::{context, fallback, materializer, primary};

/// Cooperative cancellation, per §5: checked between the `modeled` and
/// `solved` phases. Cloning shares the same underlying flag, so a caller can
/// hold one end while the orchestrator polls the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Created,
    Loaded,
    Modeled,
    Solved,
    Fallback,
    Materialized,
    Failed,
}

impl RunState {
    fn can_transition_to(self, to: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, to),
            (Created, Loaded)
                | (Created, Failed)
                | (Loaded, Modeled)
                | (Loaded, Fallback)
                | (Loaded, Failed)
                | (Modeled, Solved)
                | (Modeled, Fallback)
                | (Modeled, Failed)
                | (Solved, Materialized)
                | (Fallback, Materialized)
                | (Fallback, Failed)
        )
    }
}

struct Run {
    state: RunState,
}

impl Run {
    fn new() -> Self {
        Run {
            state: RunState::Created,
        }
    }

    fn transition(&mut self, to: RunState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal solve run transition {:?} -> {:?}",
            self.state,
            to
        );
        log::debug!("solve run {:?} -> {:?}", self.state, to);
        self.state = to;
    }
}

/// Run one full solve: load, conflict-check, model and solve (or fall back),
/// then materialize. `Err` is reserved for the two infrastructure failures
/// that mean the run never produced a meaningful outcome to report on — the
/// Input Loader finding nothing to solve, and the Materializer's write
/// failing; both carry a real HTTP status at the edge (see server.rs). Every
/// other outcome, including a solver that ran and failed (infeasible,
/// timed out, unsatisfiable, cancelled), is returned as `Ok` with a
/// `SolveReport` whose `success` is `false`, per §7.
///
/// Equivalent to [`solve_cancellable`] with a token that is never cancelled.
pub fn solve(
    store: &MemoryStore,
    request: SolveRequest,
    config: &AppConfig,
) -> Result<SolveReport, SolveError> {
    solve_cancellable(store, request, config, &CancellationToken::new())
}

/// Same as [`solve`], but checks `cancellation` between the `modeled` and
/// `solved` phases (§5) and aborts to *failed* with no mutation if it has
/// been cancelled by then.
pub fn solve_cancellable(
    store: &MemoryStore,
    request: SolveRequest,
    config: &AppConfig,
    cancellation: &CancellationToken,
) -> Result<SolveReport, SolveError> {
    let mut run = Run::new();
    log::info!(
        "solve run created: career={} term={} period={}",
        request.career_id,
        request.term_index,
        request.academic_period
    );

    let budget_seconds = request
        .solver_budget_seconds
        .unwrap_or(config.default_solver_budget_seconds);
    let prefer_fallback = request.prefer_fallback || config.fallback_only;
    let worker_count = config.solver_worker_count;

    let ctx = match context::build_context(store, request) {
        Ok(ctx) => ctx,
        Err(err) => {
            run.transition(RunState::Failed);
            return Err(err);
        }
    };
    run.transition(RunState::Loaded);

    let (algorithm, assignments) = if prefer_fallback {
        log::info!("primary engine skipped: fallback preferred or configured fallback-only");
        run.transition(RunState::Fallback);
        match fallback::solve_fallback(&ctx) {
            Ok(assignments) => (Algorithm::Fallback, assignments),
            Err(err) => {
                run.transition(RunState::Failed);
                return Ok(SolveReport::failure(err.to_string()));
            }
        }
    } else {
        run.transition(RunState::Modeled);
        if cancellation.is_cancelled() {
            log::info!("solve run cancelled between modeled and solved phases");
            run.transition(RunState::Failed);
            return Ok(SolveReport::failure(SolveError::Cancelled.to_string()));
        }
        match primary::solve_primary(&ctx, budget_seconds, worker_count) {
            Ok(assignments) => {
                run.transition(RunState::Solved);
                (Algorithm::Primary, assignments)
            }
            Err(primary_err) => {
                log::warn!("primary solver failed ({primary_err}), yielding to fallback");
                run.transition(RunState::Fallback);
                match fallback::solve_fallback(&ctx) {
                    Ok(assignments) => (Algorithm::Fallback, assignments),
                    Err(fallback_err) => {
                        run.transition(RunState::Failed);
                        return Ok(SolveReport::failure(format!(
                            "primary solver: {primary_err}; fallback solver: {fallback_err}"
                        )));
                    }
                }
            }
        }
    };

    match materializer::materialize(store, &ctx, algorithm, assignments) {
        Ok(report) => {
            run.transition(RunState::Materialized);
            Ok(report)
        }
        Err(err) => {
            run.transition(RunState::Failed);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_to_fallback_is_not_a_legal_transition() {
        assert!(!RunState::Solved.can_transition_to(RunState::Fallback));
    }

    #[test]
    fn fallback_reachable_from_loaded_and_modeled() {
        assert!(RunState::Loaded.can_transition_to(RunState::Fallback));
        assert!(RunState::Modeled.can_transition_to(RunState::Fallback));
    }

    #[test]
    fn materialized_and_failed_are_terminal_only_from_solved_or_fallback() {
        assert!(RunState::Solved.can_transition_to(RunState::Materialized));
        assert!(RunState::Fallback.can_transition_to(RunState::Materialized));
        assert!(!RunState::Loaded.can_transition_to(RunState::Materialized));
    }

    #[test]
    fn pre_cancelled_token_aborts_before_the_primary_engine_runs() {
        use crate::domain::{
            Course, EmploymentClass, Instructor, Shift, ShiftFilter, TimeSlot, Weekday,
        };
        use chrono::NaiveTime;
        use std::collections::HashSet;

        let store = MemoryStore::new();
        store.add_instructor(Instructor {
            id: 1,
            display_name: "Prof".into(),
            class: EmploymentClass::FullTime,
            active: true,
            career_memberships: vec![1],
        });
        store.add_course(Course {
            id: 1,
            code: "C1".into(),
            display_name: "Course 1".into(),
            career_id: 1,
            term_index: 1,
            weekly_hours: 3,
            active: true,
        });
        store.add_slot(TimeSlot {
            id: 1,
            shift: Shift::Morning,
            ordinal: 1,
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            active: true,
            schedulable: true,
        });

        let request = SolveRequest {
            career_id: 1,
            term_index: 1,
            shift: ShiftFilter::Morning,
            weekday_mask: HashSet::from([Weekday::Mon]),
            academic_period: "2026-1".to_string(),
            submitter_id: 1,
            solver_budget_seconds: None,
            prefer_fallback: false,
            group_label: "A".to_string(),
        };

        let token = CancellationToken::new();
        token.cancel();
        let report = solve_cancellable(&store, request, &AppConfig::default(), &token)
            .expect("cancellation is reported in-band, not as an Err");

        assert!(!report.success);
        assert!(store.active_assignments().is_empty());
    }
}
