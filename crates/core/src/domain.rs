use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{info, warn};
use types::{
    ClassId, ComboId, FacultyId, FixedSlot, Grid, Instance, SoftWeights, SubjectId, SubjectKind,
};

use crate::constraints::{demand_shapes, Occupancy, Placement, Shape};
use crate::error::{EngineError, ValidationError};

#[derive(Clone, Debug)]
pub struct FacultyInfo {
    pub id: FacultyId,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct SubjectInfo {
    pub id: SubjectId,
    pub name: String,
    pub kind: SubjectKind,
    pub weekly_hours: u32,
}

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub section: String,
    pub days: u8,
}

#[derive(Clone, Debug)]
pub struct ComboInfo {
    pub id: ComboId,
    pub faculty: usize,
    pub subject: usize,
    pub class: usize,
    pub kind: SubjectKind,
    pub weekly_hours: u32,
    /// Units still to be placed once fixed slots are applied.
    pub demand: Vec<Shape>,
}

impl ComboInfo {
    pub fn remaining_hours(&self) -> u32 {
        self.demand.iter().map(|s| s.len() as u32).sum()
    }
}

/// Validated, index-resolved snapshot of one generation request. Immutable
/// once built; trials share it read-only.
#[derive(Clone, Debug)]
pub struct Domain {
    pub grid: Grid,
    pub weights: SoftWeights,
    pub faculties: Vec<FacultyInfo>,
    pub subjects: Vec<SubjectInfo>,
    pub classes: Vec<ClassInfo>,
    pub combos: Vec<ComboInfo>,
    pub pinned: Vec<Placement>,
    pub fixed_slots: Vec<FixedSlot>,
}

fn chk_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<&'a str, usize>, ValidationError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id, i).is_some() {
            return Err(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

impl Domain {
    pub fn build(inst: &Instance, grid: Grid) -> Result<Self, EngineError> {
        if !(1..=7).contains(&grid.days_per_week) || !(1..=24).contains(&grid.hours_per_day) {
            return Err(ValidationError::InvalidGrid {
                days: grid.days_per_week,
                hours: grid.hours_per_day,
            }
            .into());
        }

        let faculty_idx = chk_unique("faculty", inst.faculties.iter().map(|x| x.id.0.as_str()))?;
        let subject_idx = chk_unique("subject", inst.subjects.iter().map(|x| x.id.0.as_str()))?;
        let class_idx = chk_unique("class", inst.classes.iter().map(|x| x.id.0.as_str()))?;
        let combo_idx = chk_unique("combo", inst.combos.iter().map(|x| x.id.0.as_str()))?;

        let faculties: Vec<FacultyInfo> = inst
            .faculties
            .iter()
            .map(|f| FacultyInfo {
                id: f.id.clone(),
                name: f.name.clone(),
            })
            .collect();

        let mut subjects = Vec::with_capacity(inst.subjects.len());
        for s in &inst.subjects {
            if s.weekly_hours == 0 {
                return Err(ValidationError::ZeroHours(s.id.0.clone()).into());
            }
            subjects.push(SubjectInfo {
                id: s.id.clone(),
                name: s.name.clone(),
                kind: s.kind,
                weekly_hours: s.weekly_hours,
            });
        }

        let mut classes = Vec::with_capacity(inst.classes.len());
        for c in &inst.classes {
            let days = c.days_per_week.unwrap_or(grid.days_per_week);
            if days == 0 || days > grid.days_per_week {
                return Err(ValidationError::ClassDaysOutOfRange {
                    class: c.id.0.clone(),
                    days,
                    max: grid.days_per_week,
                }
                .into());
            }
            classes.push(ClassInfo {
                id: c.id.clone(),
                name: c.name.clone(),
                section: c.section.clone(),
                days,
            });
        }

        let mut combos = Vec::with_capacity(inst.combos.len());
        let mut subject_per_class: HashSet<(usize, usize)> = HashSet::new();
        for k in &inst.combos {
            let missing = |kind: &'static str, id: &str| ValidationError::MissingReference {
                owner: format!("combo {}", k.id),
                kind,
                id: id.to_string(),
            };
            let &fi = faculty_idx
                .get(k.faculty_id.0.as_str())
                .ok_or_else(|| missing("faculty", &k.faculty_id.0))?;
            let &si = subject_idx
                .get(k.subject_id.0.as_str())
                .ok_or_else(|| missing("subject", &k.subject_id.0))?;
            let &ci = class_idx
                .get(k.class_id.0.as_str())
                .ok_or_else(|| missing("class", &k.class_id.0))?;

            let subject = &inst.subjects[si];
            let class = &inst.classes[ci];
            if subject.sem != class.sem {
                return Err(ValidationError::SemesterMismatch {
                    subject: subject.id.0.clone(),
                    subject_sem: subject.sem,
                    class: class.id.0.clone(),
                    class_sem: class.sem,
                }
                .into());
            }
            if !subject_per_class.insert((ci, si)) {
                return Err(ValidationError::DuplicateSubjectForClass {
                    class: class.id.0.clone(),
                    subject: subject.id.0.clone(),
                }
                .into());
            }

            let capacity = classes[ci].days as usize * grid.hours_per_day as usize;
            if subject.weekly_hours as usize > capacity {
                return Err(EngineError::InsufficientCapacity {
                    class: class.id.0.clone(),
                    demand: subject.weekly_hours as usize,
                    capacity,
                });
            }

            combos.push(ComboInfo {
                id: k.id.clone(),
                faculty: fi,
                subject: si,
                class: ci,
                kind: subject.kind,
                weekly_hours: subject.weekly_hours,
                demand: demand_shapes(subject.kind, subject.weekly_hours),
            });
        }

        for (ci, c) in inst.classes.iter().enumerate() {
            for listed in &c.combos {
                let Some(&k) = combo_idx.get(listed.0.as_str()) else {
                    return Err(ValidationError::MissingReference {
                        owner: format!("class {}", c.id),
                        kind: "combo",
                        id: listed.0.clone(),
                    }
                    .into());
                };
                if combos[k].class != ci {
                    return Err(ValidationError::ComboClassMismatch {
                        combo: listed.0.clone(),
                        listed_by: c.id.0.clone(),
                        class: classes[combos[k].class].id.0.clone(),
                    }
                    .into());
                }
            }
            if let Some(declared) = c.total_class_hours {
                let computed: u32 = combos
                    .iter()
                    .filter(|k| k.class == ci)
                    .map(|k| k.weekly_hours)
                    .sum();
                if declared != 0 && declared != computed {
                    warn!(class = %c.id, declared, computed, "total_class_hours disagrees with combos");
                }
            }
        }

        let mut domain = Domain {
            grid,
            weights: inst.policy.soft_weights.clone(),
            faculties,
            subjects,
            classes,
            combos,
            pinned: Vec::new(),
            fixed_slots: inst.fixed_slots.clone(),
        };
        domain.apply_fixed_slots(&combo_idx)?;
        domain.check_capacity()?;

        info!(
            faculties = domain.faculties.len(),
            classes = domain.classes.len(),
            combos = domain.combos.len(),
            pinned = domain.pinned.len(),
            "domain built"
        );
        Ok(domain)
    }

    /// Fresh occupancy with every pinned placement already claimed.
    pub fn pinned_occupancy(&self) -> Occupancy {
        let mut occ = Occupancy::new(self.grid, self.classes.len(), self.faculties.len());
        for p in &self.pinned {
            occ.occupy(self, p);
        }
        occ
    }

    /// Remaining hours the search must place for `class`.
    pub fn class_demand(&self, class: usize) -> usize {
        self.combos
            .iter()
            .filter(|k| k.class == class)
            .map(|k| k.remaining_hours() as usize)
            .sum()
    }

    /// Claims every pinned hour first, then settles the block shape of lab
    /// pins so the outcome does not depend on the order pins are listed.
    fn apply_fixed_slots(&mut self, combo_idx: &HashMap<&str, usize>) -> Result<(), EngineError> {
        let mut occ = Occupancy::new(self.grid, self.classes.len(), self.faculties.len());
        let fixed = std::mem::take(&mut self.fixed_slots);
        // lab combo -> pinned (day, hour), deduplicated and ordered
        let mut lab_hours: BTreeMap<usize, BTreeSet<(u8, u8)>> = BTreeMap::new();

        for fs in &fixed {
            let Some(&k) = combo_idx.get(fs.combo_id.0.as_str()) else {
                return Err(ValidationError::MissingReference {
                    owner: "fixed slot".into(),
                    kind: "combo",
                    id: fs.combo_id.0.clone(),
                }
                .into());
            };
            let combo = &self.combos[k];
            let class = &self.classes[combo.class];
            if fs.day >= class.days || fs.hour >= self.grid.hours_per_day {
                return Err(ValidationError::FixedSlotOutOfRange {
                    combo: fs.combo_id.0.clone(),
                    day: fs.day,
                    hour: fs.hour,
                }
                .into());
            }
            if combo.kind == SubjectKind::Lab && !lab_hours.entry(k).or_default().insert((fs.day, fs.hour)) {
                continue;
            }
            self.claim(&mut occ, k, fs.day, fs.hour)?;

            if combo.kind == SubjectKind::Theory {
                self.take_unit(k, Shape::Single, fs.day, fs.hour)?;
            }
        }

        for (k, hours) in lab_hours {
            self.settle_lab_pins(&mut occ, k, &hours)?;
        }

        self.fixed_slots = fixed;
        Ok(())
    }

    /// Marks one hour as held by combo `k`, failing if its class or faculty
    /// is already busy there.
    fn claim(&self, occ: &mut Occupancy, k: usize, day: u8, hour: u8) -> Result<(), ValidationError> {
        let combo = &self.combos[k];
        if occ.class_at(combo.class, day, hour).is_some() {
            return Err(ValidationError::ConflictingFixedSlots {
                owner: format!("class {}", self.classes[combo.class].id),
                day,
                hour,
            });
        }
        if occ.faculty_at(combo.faculty, day, hour).is_some() {
            return Err(ValidationError::ConflictingFixedSlots {
                owner: format!("faculty {}", self.faculties[combo.faculty].id),
                day,
                hour,
            });
        }
        let p = Placement {
            combo: k,
            day,
            hour,
            shape: Shape::Single,
            fixed: true,
        };
        occ.occupy(self, &p);
        Ok(())
    }

    /// Removes one demand unit of `shape` and records the pinned placement.
    fn take_unit(&mut self, k: usize, shape: Shape, day: u8, hour: u8) -> Result<(), ValidationError> {
        let demand = &mut self.combos[k].demand;
        let Some(pos) = demand.iter().position(|s| *s == shape) else {
            return Err(ValidationError::FixedSlotExceedsDemand {
                combo: self.combos[k].id.0.clone(),
            });
        };
        demand.remove(pos);
        self.pinned.push(Placement {
            combo: k,
            day,
            hour,
            shape,
            fixed: true,
        });
        Ok(())
    }

    /// Consecutive pinned hours form pairs. A lone pinned hour takes a free
    /// neighbour (after, else before) while pairs remain, and falls back to
    /// the odd single.
    fn settle_lab_pins(
        &mut self,
        occ: &mut Occupancy,
        k: usize,
        hours: &BTreeSet<(u8, u8)>,
    ) -> Result<(), ValidationError> {
        let pinned: Vec<(u8, u8)> = hours.iter().copied().collect();
        let has = |this: &Self, s: Shape| this.combos[k].demand.contains(&s);
        let mut i = 0;
        while i < pinned.len() {
            let (day, hour) = pinned[i];
            if i + 1 < pinned.len() && pinned[i + 1] == (day, hour + 1) && has(self, Shape::Pair) {
                self.take_unit(k, Shape::Pair, day, hour)?;
                i += 2;
                continue;
            }
            i += 1;

            if has(self, Shape::Pair) {
                let after = hour + 1 < self.grid.hours_per_day
                    && occ.can_place(self, k, day, hour + 1, Shape::Single);
                if after {
                    self.claim(occ, k, day, hour + 1)?;
                    self.take_unit(k, Shape::Pair, day, hour)?;
                    continue;
                }
                if hour > 0 && occ.can_place(self, k, day, hour - 1, Shape::Single) {
                    self.claim(occ, k, day, hour - 1)?;
                    self.take_unit(k, Shape::Pair, day, hour - 1)?;
                    continue;
                }
                if !has(self, Shape::Single) {
                    return Err(ValidationError::LabPinWithoutRoom {
                        combo: self.combos[k].id.0.clone(),
                        day,
                        hour,
                    });
                }
            }
            self.take_unit(k, Shape::Single, day, hour)?;
        }
        Ok(())
    }

    fn check_capacity(&self) -> Result<(), EngineError> {
        for (ci, class) in self.classes.iter().enumerate() {
            let pinned: usize = self
                .pinned
                .iter()
                .filter(|p| self.combos[p.combo].class == ci)
                .map(|p| p.shape.len() as usize)
                .sum();
            let capacity = class.days as usize * self.grid.hours_per_day as usize - pinned;
            let demand = self.class_demand(ci);
            if demand > capacity {
                return Err(EngineError::InsufficientCapacity {
                    class: class.id.0.clone(),
                    demand,
                    capacity,
                });
            }
        }
        Ok(())
    }
}
