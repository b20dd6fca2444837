//! The persistence contract (§6 of the spec) and an in-process implementation
//! of it. A concrete SQL-backed `Store` is an external collaborator per the
//! crate's non-goals; this in-memory implementation exists so the Input
//! Loader, Conflict Oracle and Materializer are runnable and testable without
//! one, the way the Design Notes ask for a "read-only data-access interface
//! ... and a transactional writer" instead of a module-level global handle.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::domain::{
    Assignment, Availability, Career, CareerId, Course, CourseId, Instructor, InstructorId, Shift,
    ShiftFilter, SlotId, TimeSlot, Weekday,
};
use crate::error::SolveError;

/// An assignment row as the persisted store holds it: the solver-facing
/// `Assignment` plus the activation/audit metadata from §6's contract.
#[derive(Debug, Clone)]
struct StoredAssignment {
    assignment: Assignment,
    active: bool,
    created_at: DateTime<Utc>,
    created_by: u32,
}

#[derive(Debug, Default)]
struct StoreData {
    instructors: Vec<Instructor>,
    careers: Vec<Career>,
    courses: Vec<Course>,
    slots: Vec<TimeSlot>,
    availability: HashMap<(InstructorId, Weekday, SlotId), bool>,
    assignments: Vec<StoredAssignment>,
}

/// In-process store satisfying the §6 persisted-state layout. Guarded by a
/// single `RwLock` so the Materializer's deactivate-then-insert sequence is
/// observed atomically by concurrent readers, mirroring the "single
/// serializable transaction" requirement of §4.6 without a real database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            data: RwLock::new(StoreData::default()),
        }
    }

    pub fn add_instructor(&self, instructor: Instructor) {
        self.data.write().unwrap().instructors.push(instructor);
    }

    pub fn add_career(&self, career: Career) {
        self.data.write().unwrap().careers.push(career);
    }

    pub fn add_course(&self, course: Course) {
        self.data.write().unwrap().courses.push(course);
    }

    pub fn add_slot(&self, slot: TimeSlot) {
        self.data.write().unwrap().slots.push(slot);
    }

    pub fn set_availability(
        &self,
        instructor_id: InstructorId,
        weekday: Weekday,
        slot_id: SlotId,
        available: bool,
    ) {
        self.data
            .write()
            .unwrap()
            .availability
            .insert((instructor_id, weekday, slot_id), available);
    }

    /// Seed a pre-existing, already-committed assignment (for example one
    /// owned by another career in the same academic period), used to
    /// exercise the Conflict Oracle's blackout detection.
    pub fn seed_assignment(&self, assignment: Assignment, created_by: u32) {
        self.data.write().unwrap().assignments.push(StoredAssignment {
            assignment,
            active: true,
            created_at: Utc::now(),
            created_by,
        });
    }

    pub fn active_instructors_for_career(
        &self,
        career_id: CareerId,
    ) -> Result<Vec<Instructor>, SolveError> {
        let data = self.data.read().unwrap();
        let chair_id = data
            .careers
            .iter()
            .find(|c| c.id == career_id)
            .and_then(|c| c.chair_instructor_id);

        let instructors = data
            .instructors
            .iter()
            .filter(|i| {
                i.active
                    && (i.career_memberships.contains(&career_id) || Some(i.id) == chair_id)
            })
            .cloned()
            .collect();
        Ok(instructors)
    }

    pub fn courses_for_career_term(
        &self,
        career_id: CareerId,
        term_index: u32,
    ) -> Result<Vec<Course>, SolveError> {
        let data = self.data.read().unwrap();
        Ok(data
            .courses
            .iter()
            .filter(|c| c.active && c.career_id == career_id && c.term_index == term_index)
            .cloned()
            .collect())
    }

    pub fn slots_for_shift(&self, shift: ShiftFilter) -> Result<Vec<TimeSlot>, SolveError> {
        let data = self.data.read().unwrap();
        let mut slots: Vec<TimeSlot> = data
            .slots
            .iter()
            .filter(|s| s.active && s.schedulable && shift.matches(s.shift))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (shift_rank(s.shift), s.ordinal));
        Ok(slots)
    }

    pub fn availability_for(
        &self,
        instructor_ids: &[InstructorId],
    ) -> Result<Availability, SolveError> {
        let data = self.data.read().unwrap();
        let mut availability = Availability::new();
        for ((instructor_id, weekday, slot_id), available) in data.availability.iter() {
            if instructor_ids.contains(instructor_id) {
                availability.set(*instructor_id, *weekday, *slot_id, *available);
            }
        }
        Ok(availability)
    }

    /// Commitments other careers already hold in the same academic period,
    /// for the given instructors. This is the read side the Conflict Oracle
    /// consumes.
    pub fn other_career_assignments(
        &self,
        academic_period: &str,
        career_id: CareerId,
        instructor_ids: &[InstructorId],
    ) -> Result<Vec<Assignment>, SolveError> {
        let data = self.data.read().unwrap();
        let course_career: HashMap<CourseId, CareerId> =
            data.courses.iter().map(|c| (c.id, c.career_id)).collect();

        Ok(data
            .assignments
            .iter()
            .filter(|row| row.active)
            .filter(|row| row.assignment.academic_period == academic_period)
            .filter(|row| instructor_ids.contains(&row.assignment.instructor_id))
            .filter(|row| {
                course_career
                    .get(&row.assignment.course_id)
                    .map(|c| *c != career_id)
                    .unwrap_or(true)
            })
            .map(|row| row.assignment.clone())
            .collect())
    }

    /// Transactional writer used by the Materializer: deactivates every
    /// active assignment for (academic_period, career) and inserts the new
    /// set, as one critical section guarded by the write lock.
    pub fn deactivate_and_insert(
        &self,
        academic_period: &str,
        career_id: CareerId,
        created_by: u32,
        new_assignments: Vec<Assignment>,
    ) -> Result<(), SolveError> {
        let mut data = self.data.write().unwrap();
        let course_career: HashMap<CourseId, CareerId> =
            data.courses.iter().map(|c| (c.id, c.career_id)).collect();

        for row in data.assignments.iter_mut() {
            if row.assignment.academic_period == academic_period
                && course_career
                    .get(&row.assignment.course_id)
                    .map(|c| *c == career_id)
                    .unwrap_or(false)
            {
                row.active = false;
            }
        }

        let now = Utc::now();
        for assignment in new_assignments {
            data.assignments.push(StoredAssignment {
                assignment,
                active: true,
                created_at: now,
                created_by,
            });
        }
        Ok(())
    }

    /// All currently active assignments, for inspection in tests.
    pub fn active_assignments(&self) -> Vec<Assignment> {
        self.data
            .read()
            .unwrap()
            .assignments
            .iter()
            .filter(|row| row.active)
            .map(|row| row.assignment.clone())
            .collect()
    }
}

fn shift_rank(shift: Shift) -> u8 {
    match shift {
        Shift::Morning => 0,
        Shift::Afternoon => 1,
    }
}
