//! Conflict Oracle: for every instructor in the current problem, compute the
//! set of (weekday, slot) pairs already committed to other careers in the
//! same academic period. These are hard blackouts layered on top of the
//! instructor's own availability.

use std::collections::{HashMap, HashSet};

use crate::domain::{InstructorId, SlotId, Weekday};
use crate::domain::SolveRequest;
use crate::error::SolveError;
use crate::store::MemoryStore;

pub fn compute_blackouts(
    store: &MemoryStore,
    request: &SolveRequest,
    instructor_ids: &[InstructorId],
) -> Result<HashMap<InstructorId, HashSet<(Weekday, SlotId)>>, SolveError> {
    let other_assignments = store.other_career_assignments(
        &request.academic_period,
        request.career_id,
        instructor_ids,
    )?;

    let mut blackouts: HashMap<InstructorId, HashSet<(Weekday, SlotId)>> = HashMap::new();
    for assignment in other_assignments {
        blackouts
            .entry(assignment.instructor_id)
            .or_default()
            .insert((assignment.weekday, assignment.slot_id));
    }

    log::info!(
        "conflict oracle found blackouts for {} of {} instructors",
        blackouts.len(),
        instructor_ids.len()
    );

    Ok(blackouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Assignment, Career, Course, EmploymentClass, Instructor, Shift, ShiftFilter, TimeSlot,
    };
    use chrono::NaiveTime;
    use std::collections::HashSet as Set;

    fn base_request() -> SolveRequest {
        SolveRequest {
            career_id: 1,
            term_index: 1,
            shift: ShiftFilter::Morning,
            weekday_mask: Set::from([Weekday::Mon, Weekday::Tue]),
            academic_period: "2026-1".to_string(),
            submitter_id: 1,
            solver_budget_seconds: None,
            prefer_fallback: false,
            group_label: "A".to_string(),
        }
    }

    #[test]
    fn blackout_from_another_career_in_same_period_is_detected() {
        let store = MemoryStore::new();
        store.add_career(Career {
            id: 1,
            code: "C1".into(),
            display_name: "Career 1".into(),
            chair_instructor_id: None,
        });
        store.add_career(Career {
            id: 2,
            code: "C2".into(),
            display_name: "Career 2".into(),
            chair_instructor_id: None,
        });
        store.add_instructor(Instructor {
            id: 100,
            display_name: "X".into(),
            class: EmploymentClass::FullTime,
            active: true,
            career_memberships: vec![1, 2],
        });
        store.add_course(Course {
            id: 10,
            code: "OTHER".into(),
            display_name: "Other Career Course".into(),
            career_id: 2,
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
        store.seed_assignment(
            Assignment {
                instructor_id: 100,
                course_id: 10,
                slot_id: 1,
                weekday: Weekday::Mon,
                academic_period: "2026-1".to_string(),
                group_label: "A".to_string(),
            },
            1,
        );

        let request = base_request();
        let blackouts = compute_blackouts(&store, &request, &[100]).unwrap();
        assert!(blackouts.get(&100).unwrap().contains(&(Weekday::Mon, 1)));
    }

    #[test]
    fn same_career_assignment_is_not_a_blackout() {
        let store = MemoryStore::new();
        store.add_career(Career {
            id: 1,
            code: "C1".into(),
            display_name: "Career 1".into(),
            chair_instructor_id: None,
        });
        store.add_instructor(Instructor {
            id: 100,
            display_name: "X".into(),
            class: EmploymentClass::FullTime,
            active: true,
            career_memberships: vec![1],
        });
        store.add_course(Course {
            id: 10,
            code: "SAME".into(),
            display_name: "Same Career Course".into(),
            career_id: 1,
            term_index: 1,
            weekly_hours: 3,
            active: true,
        });
        store.seed_assignment(
            Assignment {
                instructor_id: 100,
                course_id: 10,
                slot_id: 1,
                weekday: Weekday::Mon,
                academic_period: "2026-1".to_string(),
                group_label: "A".to_string(),
            },
            1,
        );

        let request = base_request();
        let blackouts = compute_blackouts(&store, &request, &[100]).unwrap();
        assert!(blackouts.get(&100).is_none());
    }
}
