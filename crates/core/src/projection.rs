//! Per-class and per-faculty views derived from one assignment.

use types::{ClassCell, ClassTimetables, DayGrid, FacultyCell, FacultyTimetables};

use crate::assignment::Assignment;
use crate::domain::Domain;

pub fn class_timetables(domain: &Domain, assignment: &Assignment) -> ClassTimetables {
    let mut out: ClassTimetables = domain
        .classes
        .iter()
        .map(|c| (c.id.clone(), DayGrid::new()))
        .collect();
    for p in assignment.placements() {
        let combo = &domain.combos[p.combo];
        let subject = &domain.subjects[combo.subject];
        let faculty = &domain.faculties[combo.faculty];
        let grid = out.entry(domain.classes[combo.class].id.clone()).or_default();
        for h in p.hours() {
            grid.entry(p.day).or_default().insert(
                h,
                ClassCell {
                    combo_id: combo.id.clone(),
                    subject_id: subject.id.clone(),
                    subject_name: subject.name.clone(),
                    kind: subject.kind,
                    faculty_id: faculty.id.clone(),
                    faculty_name: faculty.name.clone(),
                    fixed: p.fixed,
                },
            );
        }
    }
    out
}

pub fn faculty_timetables(domain: &Domain, assignment: &Assignment) -> FacultyTimetables {
    let mut out: FacultyTimetables = domain
        .faculties
        .iter()
        .map(|f| (f.id.clone(), DayGrid::new()))
        .collect();
    for p in assignment.placements() {
        let combo = &domain.combos[p.combo];
        let subject = &domain.subjects[combo.subject];
        let class = &domain.classes[combo.class];
        let grid = out.entry(domain.faculties[combo.faculty].id.clone()).or_default();
        for h in p.hours() {
            grid.entry(p.day).or_default().insert(
                h,
                FacultyCell {
                    combo_id: combo.id.clone(),
                    subject_id: subject.id.clone(),
                    subject_name: subject.name.clone(),
                    kind: subject.kind,
                    class_id: class.id.clone(),
                    class_name: class.name.clone(),
                    section: class.section.clone(),
                    fixed: p.fixed,
                },
            );
        }
    }
    out
}
