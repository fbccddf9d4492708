use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid grid: {days} days x {hours} hours")]
    InvalidGrid { days: u8, hours: u8 },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("class {class} has days_per_week={days}, grid allows 1..={max}")]
    ClassDaysOutOfRange { class: String, days: u8, max: u8 },
    #[error("subject {0} has weekly_hours=0")]
    ZeroHours(String),
    #[error("{owner} references missing {kind} {id}")]
    MissingReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
    #[error("combo {combo} is listed by class {listed_by} but belongs to class {class}")]
    ComboClassMismatch {
        combo: String,
        listed_by: String,
        class: String,
    },
    #[error("subject {subject} (sem {subject_sem}) does not match class {class} (sem {class_sem})")]
    SemesterMismatch {
        subject: String,
        subject_sem: u32,
        class: String,
        class_sem: u32,
    },
    #[error("class {class} has more than one combo for subject {subject}")]
    DuplicateSubjectForClass { class: String, subject: String },
    #[error("fixed slot for combo {combo} at day {day} hour {hour} is outside the class grid")]
    FixedSlotOutOfRange { combo: String, day: u8, hour: u8 },
    #[error("lab pin for combo {combo} at day {day} hour {hour} has no free neighbour for its pair")]
    LabPinWithoutRoom { combo: String, day: u8, hour: u8 },
    #[error("combo {combo} has more fixed slots than weekly hours")]
    FixedSlotExceedsDemand { combo: String },
    #[error("fixed slots conflict on {owner} at day {day} hour {hour}")]
    ConflictingFixedSlots { owner: String, day: u8, hour: u8 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("class {class} needs {demand} hours but only {capacity} slots are free")]
    InsufficientCapacity {
        class: String,
        demand: usize,
        capacity: usize,
    },
    #[error("no feasible assignment found in {trials} trial(s)")]
    NoFeasibleAssignment { trials: u32 },
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl EngineError {
    /// Machine-readable failure code handed back to callers.
    pub fn reason(&self) -> &'static str {
        match self {
            EngineError::Validation(v) => match v {
                ValidationError::MissingReference { .. } | ValidationError::ComboClassMismatch { .. } => {
                    "missing_reference"
                }
                ValidationError::DuplicateId { .. } => "duplicate_id",
                ValidationError::DuplicateSubjectForClass { .. } => "duplicate_subject_for_class",
                ValidationError::SemesterMismatch { .. } => "semester_mismatch",
                ValidationError::ConflictingFixedSlots { .. } => "conflicting_fixed_slots",
                ValidationError::FixedSlotOutOfRange { .. }
                | ValidationError::FixedSlotExceedsDemand { .. }
                | ValidationError::LabPinWithoutRoom { .. } => "invalid_fixed_slot",
                ValidationError::InvalidGrid { .. }
                | ValidationError::ClassDaysOutOfRange { .. }
                | ValidationError::ZeroHours(_) => "invalid_input",
            },
            EngineError::InsufficientCapacity { .. } => "insufficient_capacity",
            EngineError::NoFeasibleAssignment { .. } => "no_feasible_assignment",
            EngineError::Internal(_) => "internal_error",
        }
    }
}
