//! Primary Solver: builds a Boolean decision variable per (instructor,
//! course, slot, weekday) quadruple and hands the model to the HiGHs
//! MILP engine via `good_lp`, the same stack the teacher's ILP model uses,
//! generalized from (course, room, start-slot) to the scheduling domain's
//! four axes and the nine hard constraints of spec §4.4.

use std::collections::HashMap;

use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};

use crate::distribution::distribute;
use crate::domain::{Assignment, CourseId, InstructorId, SlotId, SolveContext, Weekday};
use crate::error::SolveError;

type VarKey = (InstructorId, CourseId, SlotId, Weekday);

/// Attempt to solve `ctx` with the primary MILP engine. Returns the
/// assignment set on OPTIMAL/FEASIBLE, or a `SolveError` (Infeasible or
/// Timeout) the orchestrator uses to decide whether to fall back.
pub fn solve_primary(
    ctx: &SolveContext,
    budget_seconds: u64,
    worker_count: usize,
) -> Result<Vec<Assignment>, SolveError> {
    let weekdays = ctx.weekdays();
    log::info!(
        "primary solver: {} instructors, {} courses, {} slots, {} weekdays",
        ctx.instructors.len(),
        ctx.courses.len(),
        ctx.slots.len(),
        weekdays.len()
    );

    let mut problem = ProblemVariables::new();
    let mut var_keys = Vec::new();

    // Prune by construction: only allocate a variable for (i,c,s,d) tuples
    // that survive availability and blackout filtering up front, the same
    // technique the teacher uses in `is_assignment_possible`.
    for instructor in &ctx.instructors {
        for course in &ctx.courses {
            for slot in &ctx.slots {
                for &day in &weekdays {
                    if !ctx.availability.is_available(instructor.id, day, slot.id) {
                        continue;
                    }
                    if ctx.is_blackout(instructor.id, day, slot.id) {
                        continue;
                    }
                    var_keys.push((instructor.id, course.id, slot.id, day));
                }
            }
        }
    }

    if var_keys.is_empty() {
        return Err(SolveError::Infeasible);
    }

    let vars = problem.add_vector(variable().binary(), var_keys.len());
    let mut x: HashMap<VarKey, Variable> = HashMap::new();
    for (key, var) in var_keys.into_iter().zip(vars.into_iter()) {
        x.insert(key, var);
    }

    // Long-course spread auxiliary booleans: y[c,d] for courses with h > 5.
    let mut y: HashMap<(CourseId, Weekday), Variable> = HashMap::new();
    for course in &ctx.courses {
        if course.weekly_hours > 5 {
            for &day in &weekdays {
                y.insert((course.id, day), problem.add(variable().binary()));
            }
        }
    }

    let max_load = problem.add(variable().min(0.0));
    let min_load = problem.add(variable().min(0.0));
    let objective: Expression = max_load - min_load;

    let mut model = problem
        .minimise(objective)
        .using(default_solver)
        .set_option("threads", worker_count as i32)
        .set_option("random_seed", 1234)
        .set_option("time_limit", budget_seconds as f64)
        .set_option("log_to_console", "false");

    // 1. Course-hour exactness.
    for course in &ctx.courses {
        let total: Expression = x
            .iter()
            .filter(|((_, c, _, _), _)| *c == course.id)
            .map(|(_, v)| *v)
            .sum();
        model.add_constraint(constraint!(total == course.weekly_hours as f64));
    }

    // 2. Instructor-slot exclusivity.
    for instructor in &ctx.instructors {
        for slot in &ctx.slots {
            for &day in &weekdays {
                let busy: Expression = x
                    .iter()
                    .filter(|((i, _, s, d), _)| *i == instructor.id && *s == slot.id && *d == day)
                    .map(|(_, v)| *v)
                    .sum();
                model.add_constraint(constraint!(busy <= 1));
            }
        }
    }

    // 3. Slot exclusivity (single class per slot simplification).
    for slot in &ctx.slots {
        for &day in &weekdays {
            let occupied: Expression = x
                .iter()
                .filter(|((_, _, s, d), _)| *s == slot.id && *d == day)
                .map(|(_, v)| *v)
                .sum();
            model.add_constraint(constraint!(occupied <= 1));
        }
    }

    // 5. Instructor workload cap.
    for instructor in &ctx.instructors {
        let load: Expression = x
            .iter()
            .filter(|((i, _, _, _), _)| *i == instructor.id)
            .map(|(_, v)| *v)
            .sum();
        model.add_constraint(constraint!(load.clone() <= instructor.class.workload_cap() as f64));
        model.add_constraint(constraint!(max_load - load.clone() >= 0));
        model.add_constraint(constraint!(load - min_load >= 0));
    }

    // 6/7. Per-day per-course ceiling, including the five-hour dispersion
    // rule (distribute(5).max_per_day == 1 already encodes it).
    for course in &ctx.courses {
        let policy = distribute(course.weekly_hours);
        for &day in &weekdays {
            let per_day: Expression = x
                .iter()
                .filter(|((_, c, _, d), _)| *c == course.id && *d == day)
                .map(|(_, v)| *v)
                .sum();
            model.add_constraint(constraint!(per_day <= policy.max_per_day as f64));
        }
    }

    // 8. Long-course spread.
    for course in &ctx.courses {
        if course.weekly_hours <= 5 {
            continue;
        }
        let policy = distribute(course.weekly_hours);
        let mut day_indicators = Vec::new();
        for &day in &weekdays {
            let per_day: Expression = x
                .iter()
                .filter(|((_, c, _, d), _)| *c == course.id && *d == day)
                .map(|(_, v)| *v)
                .sum();
            let indicator = *y.get(&(course.id, day)).expect("indicator created above");
            model.add_constraint(constraint!(per_day.clone() - indicator >= 0));
            model.add_constraint(constraint!(per_day - 3.0 * indicator <= 0));
            day_indicators.push(indicator);
        }
        let spread: Expression = day_indicators.into_iter().sum();
        model.add_constraint(constraint!(spread >= policy.min_distinct_days as f64));
    }

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(err) => {
            let message = err.to_string();
            log::warn!("primary solver returned no solution: {message}");
            if message.to_lowercase().contains("infeasible") {
                return Err(SolveError::Infeasible);
            }
            return Err(SolveError::Timeout);
        }
    };

    let mut assignments = Vec::new();
    for ((instructor_id, course_id, slot_id, weekday), var) in &x {
        if solution.value(*var) > 0.5 {
            assignments.push(Assignment {
                instructor_id: *instructor_id,
                course_id: *course_id,
                slot_id: *slot_id,
                weekday: *weekday,
                academic_period: ctx.request.academic_period.clone(),
                group_label: ctx.request.group_label.clone(),
            });
        }
    }
    assignments.sort();

    log::info!("primary solver produced {} assignments", assignments.len());
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, EmploymentClass, Instructor, Shift, ShiftFilter, TimeSlot};
    use chrono::NaiveTime;
    use std::collections::HashMap as Map;
    use std::collections::HashSet as Set;

    fn trivial_context(weekly_hours: u32) -> SolveContext {
        let request = crate::domain::SolveRequest {
            career_id: 1,
            term_index: 1,
            shift: ShiftFilter::Morning,
            weekday_mask: Set::from([
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
            academic_period: "2026-1".to_string(),
            submitter_id: 1,
            solver_budget_seconds: Some(30),
            prefer_fallback: false,
            group_label: "A".to_string(),
        };
        SolveContext {
            request,
            instructors: vec![Instructor {
                id: 1,
                display_name: "Prof".to_string(),
                class: EmploymentClass::FullTime,
                active: true,
                career_memberships: vec![1],
            }],
            courses: vec![Course {
                id: 1,
                code: "C1".to_string(),
                display_name: "Course 1".to_string(),
                career_id: 1,
                term_index: 1,
                weekly_hours,
                active: true,
            }],
            slots: (1..=5)
                .map(|i| TimeSlot {
                    id: i,
                    shift: Shift::Morning,
                    ordinal: i,
                    start: NaiveTime::from_hms_opt(6 + i, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(7 + i, 0, 0).unwrap(),
                    active: true,
                    schedulable: true,
                })
                .collect(),
            availability: Default::default(),
            blackouts: Map::new(),
        }
    }

    #[test]
    fn trivial_instance_meets_hour_exactness() {
        let ctx = trivial_context(3);
        let assignments = solve_primary(&ctx, 30, 1).expect("expected a feasible solution");
        assert_eq!(assignments.len(), 3);
    }

    #[test]
    fn empty_variable_universe_is_infeasible() {
        let mut ctx = trivial_context(3);
        for day in Weekday::ALL {
            for slot in &ctx.slots {
                ctx.availability.set(1, day, slot.id, false);
            }
        }
        let result = solve_primary(&ctx, 5, 1);
        assert!(result.is_err());
    }
}
