use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(FacultyId);
id_newtype!(SubjectId);
id_newtype!(ClassId);
id_newtype!(ComboId);

pub const DEFAULT_DAYS_PER_WEEK: u8 = 5;
pub const DEFAULT_HOURS_PER_DAY: u8 = 9;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    #[default]
    Theory,
    Lab,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sem: u32,
    #[serde(alias = "no_of_hours_per_week")]
    pub weekly_hours: u32,
    #[serde(default, alias = "type")]
    pub kind: SubjectKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Faculty {
    pub id: FacultyId,
    #[serde(default)]
    pub name: String,
}

/// A class-section. `days_per_week` falls back to the grid's day count.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Class {
    pub id: ClassId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sem: u32,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub days_per_week: Option<u8>,
    #[serde(default, alias = "assigned_teacher_subject_combos")]
    pub combos: Vec<ComboId>,
    #[serde(default)]
    pub total_class_hours: Option<u32>,
}

/// "This faculty teaches this subject to this class every week."
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Combo {
    pub id: ComboId,
    #[serde(default, alias = "combo_name")]
    pub name: String,
    pub faculty_id: FacultyId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
pub struct FixedSlot {
    pub combo_id: ComboId,
    pub day: u8,
    pub hour: u8,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct Grid {
    #[serde(default = "default_days")]
    pub days_per_week: u8,
    #[serde(default = "default_hours")]
    pub hours_per_day: u8,
}

fn default_days() -> u8 {
    DEFAULT_DAYS_PER_WEEK
}

fn default_hours() -> u8 {
    DEFAULT_HOURS_PER_DAY
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            days_per_week: DEFAULT_DAYS_PER_WEEK,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
        }
    }
}

impl Grid {
    pub fn slots(&self) -> usize {
        self.days_per_week as usize * self.hours_per_day as usize
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct SoftWeights {
    #[serde(default = "w3")]
    pub uneven_spread: u32,
    #[serde(default = "w2")]
    pub faculty_gaps: u32,
    #[serde(default = "w1")]
    pub class_gaps: u32,
    #[serde(default = "w2")]
    pub back_to_back_labs: u32,
}

fn w1() -> u32 {
    1
}
fn w2() -> u32 {
    2
}
fn w3() -> u32 {
    3
}

impl Default for SoftWeights {
    fn default() -> Self {
        Self {
            uneven_spread: w3(),
            faculty_gaps: w2(),
            class_gaps: w1(),
            back_to_back_labs: w2(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default)]
pub struct Policy {
    #[serde(default)]
    pub soft_weights: SoftWeights,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct SearchParams {
    #[serde(default = "default_trials")]
    pub trial_count: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_budget")]
    pub backtrack_budget: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit_ms: u64,
    #[serde(default = "default_attempts")]
    pub generate_attempts: u32,
}

fn default_trials() -> u32 {
    16
}
fn default_budget() -> u32 {
    20_000
}
fn default_time_limit() -> u64 {
    10_000
}
fn default_attempts() -> u32 {
    8
}

pub const MAX_TRIAL_COUNT: u32 = 256;
pub const MAX_GENERATE_ATTEMPTS: u32 = 64;
pub const MAX_BACKTRACK_BUDGET: u32 = 2_000_000;
pub const MAX_TIME_LIMIT_MS: u64 = 120_000;

impl SearchParams {
    /// Same parameters with every field held to the service ceilings.
    pub fn clamped(&self) -> Self {
        Self {
            trial_count: self.trial_count.clamp(1, MAX_TRIAL_COUNT),
            seed: self.seed,
            backtrack_budget: self.backtrack_budget.min(MAX_BACKTRACK_BUDGET),
            time_limit_ms: self.time_limit_ms.min(MAX_TIME_LIMIT_MS),
            generate_attempts: self.generate_attempts.clamp(1, MAX_GENERATE_ATTEMPTS),
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            trial_count: default_trials(),
            seed: 0,
            backtrack_budget: default_budget(),
            time_limit_ms: default_time_limit(),
            generate_attempts: default_attempts(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default)]
pub struct Instance {
    #[serde(default)]
    pub faculties: Vec<Faculty>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default, alias = "fixedSlots")]
    pub fixed_slots: Vec<FixedSlot>,
    #[serde(default)]
    pub policy: Policy,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub instance: Instance,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub params: Option<SearchParams>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct OptimizeRequest {
    #[serde(flatten)]
    pub instance: Instance,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub params: Option<SearchParams>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct ClassCell {
    pub combo_id: ComboId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub kind: SubjectKind,
    pub faculty_id: FacultyId,
    pub faculty_name: String,
    pub fixed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct FacultyCell {
    pub combo_id: ComboId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub kind: SubjectKind,
    pub class_id: ClassId,
    pub class_name: String,
    pub section: String,
    pub fixed: bool,
}

/// day -> hour -> cell; only occupied slots are present.
pub type DayGrid<T> = BTreeMap<u8, BTreeMap<u8, T>>;
pub type ClassTimetables = BTreeMap<ClassId, DayGrid<ClassCell>>;
pub type FacultyTimetables = BTreeMap<FacultyId, DayGrid<FacultyCell>>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct GenerateResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub class_timetables: Option<ClassTimetables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub faculty_timetables: Option<FacultyTimetables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub stats: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct OptimizeResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub best_class_timetables: Option<ClassTimetables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub best_faculty_timetables: Option<FacultyTimetables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub stats: serde_json::Value,
}
