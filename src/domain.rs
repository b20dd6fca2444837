use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// Type aliases for clarity
pub type InstructorId = u32;
pub type CareerId = u32;
pub type CourseId = u32;
pub type SlotId = u32;

/// Employment class of an instructor; drives the weekly workload cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EmploymentClass {
    FullTime,
    Adjunct,
}

impl EmploymentClass {
    /// Upper bound on weekly assignment count for this class.
    pub fn workload_cap(self) -> u32 {
        match self {
            EmploymentClass::FullTime => 40,
            EmploymentClass::Adjunct => 20,
        }
    }
}

/// One of the six schedulable weekdays, indexed 0..5 (Mon..Sat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Mon => "lunes",
            Weekday::Tue => "martes",
            Weekday::Wed => "miercoles",
            Weekday::Thu => "jueves",
            Weekday::Fri => "viernes",
            Weekday::Sat => "sabado",
        };
        write!(f, "{name}")
    }
}

/// Morning or afternoon block; a slot belongs to exactly one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Shift {
    Morning,
    Afternoon,
}

/// Shift selector on a SolveRequest: either a single shift or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShiftFilter {
    Morning,
    Afternoon,
    Both,
}

impl ShiftFilter {
    pub fn matches(self, shift: Shift) -> bool {
        match self {
            ShiftFilter::Both => true,
            ShiftFilter::Morning => shift == Shift::Morning,
            ShiftFilter::Afternoon => shift == Shift::Afternoon,
        }
    }
}

/// An instructor who may be assigned to courses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: InstructorId,
    pub display_name: String,
    pub class: EmploymentClass,
    pub active: bool,
    pub career_memberships: Vec<CareerId>,
}

/// A career program; may nominate a chair instructor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub id: CareerId,
    pub code: String,
    pub display_name: String,
    pub chair_instructor_id: Option<InstructorId>,
}

/// A course requiring a fixed weekly hour load within one term of one career.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub display_name: String,
    pub career_id: CareerId,
    pub term_index: u32,
    pub weekly_hours: u32,
    pub active: bool,
}

/// An indivisible time slot. Break slots are marked `schedulable = false`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: SlotId,
    pub shift: Shift,
    pub ordinal: u32,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub active: bool,
    pub schedulable: bool,
}

/// A single, scheduled (instructor, course, slot, weekday) quadruple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub instructor_id: InstructorId,
    pub course_id: CourseId,
    pub slot_id: SlotId,
    pub weekday: Weekday,
    pub academic_period: String,
    pub group_label: String,
}

/// A request to (re)generate the timetable for one career/term/period slice.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub career_id: CareerId,
    pub term_index: u32,
    pub shift: ShiftFilter,
    pub weekday_mask: HashSet<Weekday>,
    pub academic_period: String,
    pub submitter_id: u32,
    #[serde(default)]
    pub solver_budget_seconds: Option<u64>,
    #[serde(default)]
    pub prefer_fallback: bool,
    #[serde(default = "default_group_label")]
    pub group_label: String,
}

fn default_group_label() -> String {
    "A".to_string()
}

/// Which algorithm produced a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    Primary,
    Fallback,
}

/// Aggregate counts describing a completed (or failed) solve.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveCounts {
    pub total_assignments: usize,
    pub distinct_instructors: usize,
    pub distinct_courses: usize,
    pub course_coverage_percent: f64,
}

/// The result of a solve invocation, returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub success: bool,
    pub message: String,
    pub algorithm: Option<Algorithm>,
    pub counts: SolveCounts,
    pub assignments: Vec<Assignment>,
}

impl SolveReport {
    pub fn failure(message: impl Into<String>) -> Self {
        SolveReport {
            success: false,
            message: message.into(),
            algorithm: None,
            counts: SolveCounts::default(),
            assignments: Vec::new(),
        }
    }
}

/// Dense availability tensor: (instructor, weekday, slot) -> available.
/// Absence of an entry means available by default.
#[derive(Debug, Clone, Default)]
pub struct Availability {
    cells: HashMap<(InstructorId, Weekday, SlotId), bool>,
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, instructor: InstructorId, weekday: Weekday, slot: SlotId, available: bool) {
        self.cells.insert((instructor, weekday, slot), available);
    }

    pub fn is_available(&self, instructor: InstructorId, weekday: Weekday, slot: SlotId) -> bool {
        self.cells
            .get(&(instructor, weekday, slot))
            .copied()
            .unwrap_or(true)
    }
}

/// The dense problem instance materialized by the Input Loader; everything
/// downstream operates over this, not over raw store rows.
#[derive(Debug, Clone)]
pub struct SolveContext {
    pub request: SolveRequest,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
    pub slots: Vec<TimeSlot>,
    pub availability: Availability,
    pub blackouts: HashMap<InstructorId, HashSet<(Weekday, SlotId)>>,
}

impl SolveContext {
    pub fn weekdays(&self) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = self.request.weekday_mask.iter().copied().collect();
        days.sort();
        days
    }

    pub fn is_blackout(&self, instructor: InstructorId, weekday: Weekday, slot: SlotId) -> bool {
        self.blackouts
            .get(&instructor)
            .map(|set| set.contains(&(weekday, slot)))
            .unwrap_or(false)
    }
}
