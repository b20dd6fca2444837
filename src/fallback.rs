//! Fallback Solver: a deterministic greedy used when the primary engine is
//! unavailable or fails to produce a solution within budget. There is no
//! greedy path in the original CP-SAT generator (it only has the OR-Tools
//! path and gives up); this module is built directly from spec §4.5, kept in
//! the teacher's index-based (`HashMap`/`HashSet` lookup) idiom.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::distribution::{distribute, split_across_days};
use crate::domain::{Assignment, CourseId, InstructorId, SlotId, SolveContext, Weekday};
use crate::error::SolveError;

pub fn solve_fallback(ctx: &SolveContext) -> Result<Vec<Assignment>, SolveError> {
    let weekdays = ctx.weekdays();
    log::info!("fallback solver: ordering {} courses", ctx.courses.len());

    let courses: Vec<_> = ctx
        .courses
        .iter()
        .sorted_by(|a, b| b.weekly_hours.cmp(&a.weekly_hours).then(a.code.cmp(&b.code)))
        .collect();

    let mut load: HashMap<InstructorId, u32> =
        ctx.instructors.iter().map(|i| (i.id, 0)).collect();
    let mut assigned_by_instructor: HashMap<InstructorId, HashSet<(Weekday, SlotId)>> =
        HashMap::new();
    let mut assigned_by_slot: HashMap<(Weekday, SlotId), CourseId> = HashMap::new();
    let mut assignments = Vec::new();

    for course in courses {
        let candidates: Vec<_> = ctx
            .instructors
            .iter()
            .sorted_by(|a, b| load[&a.id].cmp(&load[&b.id]).then(a.id.cmp(&b.id)))
            .collect();

        let mut placed = false;
        for instructor in candidates {
            let remaining_cap = instructor
                .class
                .workload_cap()
                .saturating_sub(load[&instructor.id]);
            if remaining_cap < course.weekly_hours {
                continue;
            }

            let attempt = if course.weekly_hours <= 5 {
                try_disperse(
                    ctx,
                    instructor.id,
                    course.weekly_hours,
                    &weekdays,
                    &assigned_by_slot,
                    &assigned_by_instructor,
                )
            } else {
                try_cluster(
                    ctx,
                    instructor.id,
                    course.weekly_hours,
                    &weekdays,
                    &assigned_by_slot,
                    &assigned_by_instructor,
                )
            };

            if let Some(chosen) = attempt {
                for (day, slot_id) in &chosen {
                    assigned_by_slot.insert((*day, *slot_id), course.id);
                    assigned_by_instructor
                        .entry(instructor.id)
                        .or_default()
                        .insert((*day, *slot_id));
                }
                for (day, slot_id) in chosen {
                    assignments.push(Assignment {
                        instructor_id: instructor.id,
                        course_id: course.id,
                        slot_id,
                        weekday: day,
                        academic_period: ctx.request.academic_period.clone(),
                        group_label: ctx.request.group_label.clone(),
                    });
                }
                *load.get_mut(&instructor.id).unwrap() += course.weekly_hours;
                placed = true;
                break;
            }
        }

        if !placed {
            log::warn!("fallback solver could not place course {}", course.code);
            return Err(SolveError::Unsatisfiable);
        }
    }

    assignments.sort();
    log::info!("fallback solver produced {} assignments", assignments.len());
    Ok(assignments)
}

/// h(c) <= 5: one hour per day, revisiting used days (up to 2 per day) only
/// if a single pass across the mask falls short.
fn try_disperse(
    ctx: &SolveContext,
    instructor_id: InstructorId,
    hours: u32,
    weekdays: &[Weekday],
    assigned_by_slot: &HashMap<(Weekday, SlotId), CourseId>,
    assigned_by_instructor: &HashMap<InstructorId, HashSet<(Weekday, SlotId)>>,
) -> Option<Vec<(Weekday, SlotId)>> {
    let held = assigned_by_instructor.get(&instructor_id);
    let mut chosen: Vec<(Weekday, SlotId)> = Vec::new();
    let mut day_count: HashMap<Weekday, u32> = HashMap::new();

    for &day in weekdays {
        if chosen.len() as u32 >= hours {
            break;
        }
        if let Some(slot_id) = first_free_slot(ctx, instructor_id, day, assigned_by_slot, held, &chosen) {
            chosen.push((day, slot_id));
            *day_count.entry(day).or_insert(0) += 1;
        }
    }

    if (chosen.len() as u32) < hours {
        for &day in weekdays {
            if chosen.len() as u32 >= hours {
                break;
            }
            if *day_count.get(&day).unwrap_or(&0) >= 2 {
                continue;
            }
            if let Some(slot_id) =
                first_free_slot(ctx, instructor_id, day, assigned_by_slot, held, &chosen)
            {
                chosen.push((day, slot_id));
                *day_count.entry(day).or_insert(0) += 1;
            }
        }
    }

    if chosen.len() as u32 == hours {
        Some(chosen)
    } else {
        None
    }
}

/// h(c) > 5: spread across `ceil(h/3)` days, floor(h/days) hours per day
/// with the remainder on the first days, never exceeding 3 per day.
fn try_cluster(
    ctx: &SolveContext,
    instructor_id: InstructorId,
    hours: u32,
    weekdays: &[Weekday],
    assigned_by_slot: &HashMap<(Weekday, SlotId), CourseId>,
    assigned_by_instructor: &HashMap<InstructorId, HashSet<(Weekday, SlotId)>>,
) -> Option<Vec<(Weekday, SlotId)>> {
    let policy = distribute(hours);
    let days_needed = policy.min_distinct_days as usize;
    if weekdays.len() < days_needed {
        return None;
    }
    let chosen_days = &weekdays[..days_needed];
    let per_day_counts = split_across_days(hours, days_needed as u32);

    let held = assigned_by_instructor.get(&instructor_id);
    let mut chosen: Vec<(Weekday, SlotId)> = Vec::new();

    for (&day, &count) in chosen_days.iter().zip(per_day_counts.iter()) {
        let mut placed_today = 0;
        while placed_today < count {
            match first_free_slot(ctx, instructor_id, day, assigned_by_slot, held, &chosen) {
                Some(slot_id) => {
                    chosen.push((day, slot_id));
                    placed_today += 1;
                }
                None => return None,
            }
        }
    }

    Some(chosen)
}

fn first_free_slot(
    ctx: &SolveContext,
    instructor_id: InstructorId,
    day: Weekday,
    assigned_by_slot: &HashMap<(Weekday, SlotId), CourseId>,
    held: Option<&HashSet<(Weekday, SlotId)>>,
    chosen: &[(Weekday, SlotId)],
) -> Option<SlotId> {
    for slot in &ctx.slots {
        let key = (day, slot.id);
        if assigned_by_slot.contains_key(&key) {
            continue;
        }
        if chosen.contains(&key) {
            continue;
        }
        if held.map(|h| h.contains(&key)).unwrap_or(false) {
            continue;
        }
        if !ctx.availability.is_available(instructor_id, day, slot.id) {
            continue;
        }
        if ctx.is_blackout(instructor_id, day, slot.id) {
            continue;
        }
        return Some(slot.id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Course, EmploymentClass, Instructor, Shift, ShiftFilter, SolveRequest, TimeSlot,
    };
    use chrono::NaiveTime;
    use std::collections::HashSet as Set;

    fn slots(n: u32) -> Vec<TimeSlot> {
        (1..=n)
            .map(|i| TimeSlot {
                id: i,
                shift: Shift::Morning,
                ordinal: i,
                start: NaiveTime::from_hms_opt(6 + i, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(7 + i, 0, 0).unwrap(),
                active: true,
                schedulable: true,
            })
            .collect()
    }

    fn context(course_hours: u32, mask: Vec<Weekday>) -> SolveContext {
        let request = SolveRequest {
            career_id: 1,
            term_index: 1,
            shift: ShiftFilter::Morning,
            weekday_mask: mask.into_iter().collect::<Set<_>>(),
            academic_period: "2026-1".to_string(),
            submitter_id: 1,
            solver_budget_seconds: None,
            prefer_fallback: true,
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
                weekly_hours: course_hours,
                active: true,
            }],
            slots: slots(5),
            availability: Default::default(),
            blackouts: HashMap::new(),
        }
    }

    #[test]
    fn disperses_three_hours_across_distinct_days() {
        let ctx = context(
            3,
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        );
        let assignments = solve_fallback(&ctx).unwrap();
        assert_eq!(assignments.len(), 3);
        let days: Set<Weekday> = assignments.iter().map(|a| a.weekday).collect();
        assert_eq!(days.len(), 3);
    }

    #[test]
    fn five_hour_course_lands_one_per_day() {
        let ctx = context(
            5,
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        );
        let assignments = solve_fallback(&ctx).unwrap();
        assert_eq!(assignments.len(), 5);
        let days: Set<Weekday> = assignments.iter().map(|a| a.weekday).collect();
        assert_eq!(days.len(), 5);
    }

    #[test]
    fn long_course_clusters_without_exceeding_three_per_day() {
        let ctx = context(
            7,
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        );
        let assignments = solve_fallback(&ctx).unwrap();
        assert_eq!(assignments.len(), 7);
        let mut per_day: HashMap<Weekday, u32> = HashMap::new();
        for a in &assignments {
            *per_day.entry(a.weekday).or_insert(0) += 1;
        }
        assert!(per_day.values().all(|&c| c <= 3));
        assert!(per_day.len() >= 3);
    }

    #[test]
    fn unsatisfiable_when_demand_exceeds_capacity() {
        let mut ctx = context(25, vec![Weekday::Mon, Weekday::Tue]);
        ctx.courses[0].weekly_hours = 25;
        let result = solve_fallback(&ctx);
        assert!(result.is_err());
    }
}
