use std::collections::HashSet;

use proptest::prelude::*;
use timetable_core::projection::{class_timetables, faculty_timetables};
use timetable_core::{Assignment, Domain, Shape};
use timetable_search::generate;
use types::{
    Class, Combo, Faculty, FixedSlot, Grid, Instance, SearchParams, Subject, SubjectKind,
};

#[derive(Clone, Debug)]
struct Raw {
    days: u8,
    hours: u8,
    subjects: Vec<(u32, bool)>,
    // per class: per subject (taken, faculty), plus an optional pin for the first combo
    classes: Vec<(Vec<(bool, usize)>, Option<(u8, u8)>)>,
}

fn raw() -> impl Strategy<Value = Raw> {
    (
        2u8..=5,
        3u8..=7,
        prop::collection::vec((1u32..=4, any::<bool>()), 1..=4),
        prop::collection::vec(
            (
                prop::collection::vec((any::<bool>(), 0usize..3), 4),
                prop::option::of((0u8..5, 0u8..7)),
            ),
            1..=3,
        ),
    )
        .prop_map(|(days, hours, subjects, classes)| Raw {
            days,
            hours,
            subjects,
            classes,
        })
}

fn to_instance(raw: &Raw) -> (Instance, Grid) {
    let mut inst = Instance::default();
    for f in 0..3 {
        inst.faculties.push(Faculty {
            id: format!("F{f}").as_str().into(),
            name: format!("Faculty {f}"),
        });
    }
    for (s, &(hours, lab)) in raw.subjects.iter().enumerate() {
        inst.subjects.push(Subject {
            id: format!("S{s}").as_str().into(),
            name: format!("Subject {s}"),
            sem: 1,
            weekly_hours: hours,
            kind: if lab { SubjectKind::Lab } else { SubjectKind::Theory },
        });
    }
    for (c, (picks, pin)) in raw.classes.iter().enumerate() {
        inst.classes.push(Class {
            id: format!("C{c}").as_str().into(),
            name: format!("Class {c}"),
            sem: 1,
            section: "A".into(),
            days_per_week: None,
            combos: vec![],
            total_class_hours: None,
        });
        let mut first = None;
        for (s, &(taken, f)) in picks.iter().enumerate().take(raw.subjects.len()) {
            if !taken {
                continue;
            }
            let id = format!("K{c}_{s}");
            first.get_or_insert_with(|| id.clone());
            inst.combos.push(Combo {
                id: id.as_str().into(),
                name: String::new(),
                faculty_id: format!("F{f}").as_str().into(),
                subject_id: format!("S{s}").as_str().into(),
                class_id: format!("C{c}").as_str().into(),
            });
        }
        if let (Some(id), Some((d, h))) = (first, pin) {
            inst.fixed_slots.push(FixedSlot {
                combo_id: id.as_str().into(),
                day: d % raw.days,
                hour: h % raw.hours,
            });
        }
    }
    let grid = Grid {
        days_per_week: raw.days,
        hours_per_day: raw.hours,
    };
    (inst, grid)
}

fn check_invariants(domain: &Domain, a: &Assignment) -> Result<(), TestCaseError> {
    let mut class_slots = HashSet::new();
    let mut faculty_slots = HashSet::new();
    for p in a.placements() {
        let c = &domain.combos[p.combo];
        prop_assert!(p.day < domain.classes[c.class].days);
        prop_assert!(p.end() <= domain.grid.hours_per_day);
        for h in p.hours() {
            prop_assert!(class_slots.insert((c.class, p.day, h)), "class double-booked");
            prop_assert!(faculty_slots.insert((c.faculty, p.day, h)), "faculty double-booked");
        }
    }
    for (k, c) in domain.combos.iter().enumerate() {
        prop_assert_eq!(a.hours_for(k), c.weekly_hours);
        if c.kind == SubjectKind::Lab {
            let singles = a
                .placements()
                .iter()
                .filter(|p| p.combo == k && p.shape == Shape::Single)
                .count() as u32;
            prop_assert_eq!(singles, c.weekly_hours % 2);
        }
    }
    for fs in &domain.fixed_slots {
        let combo = domain
            .combos
            .iter()
            .position(|c| c.id == fs.combo_id)
            .expect("pinned combo exists");
        let class = &domain.classes[domain.combos[combo].class];
        let cell = class_timetables(domain, a)[&class.id]
            .get(&fs.day)
            .and_then(|hours| hours.get(&fs.hour))
            .cloned();
        prop_assert!(cell.map_or(false, |c| c.combo_id == fs.combo_id && c.fixed));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn complete_results_hold_every_hard_invariant(raw in raw()) {
        let (inst, grid) = to_instance(&raw);
        let domain = match Domain::build(&inst, grid) {
            Ok(d) => d,
            Err(e) => {
                prop_assert!(
                    matches!(
                        e.reason(),
                        "insufficient_capacity" | "conflicting_fixed_slots" | "invalid_fixed_slot"
                    ),
                    "unexpected rejection {}", e
                );
                return Ok(());
            }
        };
        let params = SearchParams {
            trial_count: 1,
            seed: 3,
            backtrack_budget: 500,
            time_limit_ms: 5_000,
            generate_attempts: 2,
        };
        match generate(&domain, &params).best {
            Ok(solved) => {
                check_invariants(&domain, &solved.assignment)?;
                prop_assert_eq!(
                    class_timetables(&domain, &solved.assignment),
                    class_timetables(&domain, &solved.assignment)
                );
                prop_assert_eq!(
                    faculty_timetables(&domain, &solved.assignment),
                    faculty_timetables(&domain, &solved.assignment)
                );
            }
            Err(e) => prop_assert_eq!(e.reason(), "no_feasible_assignment"),
        }
    }
}
