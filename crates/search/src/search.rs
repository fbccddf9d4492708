//! One seeded trial of the slot-assignment search.
//!
//! Demand units are laid out in a fixed work queue and placed left to right.
//! The placement stack doubles as the undo log: on a dead end the most recent
//! placement is released and its unit resumes from the next candidate.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Instant;

use rand::{seq::SliceRandom, Rng};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use timetable_core::constraints::candidate_starts;
use timetable_core::{Assignment, Domain, Placement, Shape};
use tracing::trace;
use types::SubjectKind;

#[derive(Debug)]
pub enum TrialOutcome {
    Complete {
        assignment: Assignment,
        backtracks: u32,
    },
    Infeasible {
        backtracks: u32,
        /// Every ordering was tried; another seed cannot help either.
        exhausted: bool,
    },
    /// The wall-clock deadline passed before the trial settled.
    TimedOut { backtracks: u32 },
}

#[derive(Clone, Copy, Debug)]
struct Unit {
    combo: usize,
    shape: Shape,
}

/// Labs first, then the combos with the most hours left, ties shuffled.
fn work_queue(domain: &Domain, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut keyed: Vec<(usize, u64)> = domain
        .combos
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.demand.is_empty())
        .map(|(k, _)| (k, rng.gen::<u64>()))
        .collect();
    keyed.sort_by_key(|&(k, tie)| {
        let c = &domain.combos[k];
        (c.kind != SubjectKind::Lab, Reverse(c.remaining_hours()), tie)
    });
    keyed.into_iter().map(|(k, _)| k).collect()
}

/// Backtracks between two looks at the clock.
const CLOCK_EVERY: u32 = 256;

pub fn run_trial(domain: &Domain, seed: u64, budget: u32, deadline: Instant) -> TrialOutcome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let units: Vec<Unit> = work_queue(domain, &mut rng)
        .into_iter()
        .flat_map(|k| {
            domain.combos[k]
                .demand
                .iter()
                .map(move |&shape| Unit { combo: k, shape })
        })
        .collect();

    let mut candidates: HashMap<(usize, Shape), Vec<(u8, u8)>> = HashMap::new();
    for u in &units {
        candidates.entry((u.combo, u.shape)).or_insert_with(|| {
            let mut c = candidate_starts(domain, u.combo, u.shape);
            c.shuffle(&mut rng);
            c
        });
    }

    let mut assignment = Assignment::with_pins(domain);
    // candidate index chosen by each placed unit
    let mut chosen: Vec<usize> = Vec::with_capacity(units.len());
    let mut resume_from = 0usize;
    let mut backtracks = 0u32;

    loop {
        let i = chosen.len();
        if i == units.len() {
            trace!(seed, backtracks, "trial complete");
            return TrialOutcome::Complete {
                assignment,
                backtracks,
            };
        }

        let u = units[i];
        let cands = &candidates[&(u.combo, u.shape)];
        // interchangeable units of one combo take candidates in increasing
        // order so the same set of slots is never revisited in another order
        let mut start = resume_from;
        if i > 0 && units[i - 1].combo == u.combo && units[i - 1].shape == u.shape {
            start = start.max(chosen[i - 1] + 1);
        }

        let found = (start..cands.len()).find(|&j| {
            let (d, h) = cands[j];
            assignment.can_place(domain, u.combo, d, h, u.shape)
        });

        match found {
            Some(j) => {
                let (day, hour) = cands[j];
                assignment.push(
                    domain,
                    Placement {
                        combo: u.combo,
                        day,
                        hour,
                        shape: u.shape,
                        fixed: false,
                    },
                );
                chosen.push(j);
                resume_from = 0;
            }
            None => {
                let Some(j) = chosen.pop() else {
                    return TrialOutcome::Infeasible {
                        backtracks,
                        exhausted: true,
                    };
                };
                backtracks += 1;
                if backtracks > budget {
                    trace!(seed, backtracks, "trial over budget");
                    return TrialOutcome::Infeasible {
                        backtracks,
                        exhausted: false,
                    };
                }
                if backtracks % CLOCK_EVERY == 0 && Instant::now() >= deadline {
                    trace!(seed, backtracks, "trial out of time");
                    return TrialOutcome::TimedOut { backtracks };
                }
                assignment.pop(domain);
                resume_from = j + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use std::time::Duration;
    use types::Grid;

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(600)
    }

    #[test]
    fn single_theory_combo_completes() {
        let inst = instance(&[("K1", "F1", "S1", "C1")], &[("S1", 3, SubjectKind::Theory)]);
        let grid = Grid {
            days_per_week: 5,
            hours_per_day: 6,
        };
        let d = Domain::build(&inst, grid).unwrap();
        match run_trial(&d, 1, 1000, later()) {
            TrialOutcome::Complete { assignment, .. } => {
                assert!(assignment.verify(&d).is_ok());
                assert_eq!(assignment.hours_for(0), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn shared_faculty_on_tiny_grid_is_infeasible() {
        let inst = instance(
            &[("K1", "F1", "S1", "C1"), ("K2", "F1", "S1", "C2")],
            &[("S1", 2, SubjectKind::Theory)],
        );
        let grid = Grid {
            days_per_week: 1,
            hours_per_day: 3,
        };
        let d = Domain::build(&inst, grid).unwrap();
        assert!(matches!(
            run_trial(&d, 9, 10_000, later()),
            TrialOutcome::Infeasible {
                exhausted: true,
                ..
            }
        ));
    }

    #[test]
    fn budget_cuts_a_hopeless_search_short() {
        let inst = instance(
            &[
                ("K1", "F1", "S1", "C1"),
                ("K2", "F1", "S1", "C2"),
                ("K3", "F1", "S1", "C3"),
            ],
            &[("S1", 3, SubjectKind::Theory)],
        );
        let grid = Grid {
            days_per_week: 2,
            hours_per_day: 4,
        };
        let d = Domain::build(&inst, grid).unwrap();
        match run_trial(&d, 5, 3, later()) {
            TrialOutcome::Infeasible {
                backtracks,
                exhausted,
            } => {
                assert!(!exhausted);
                assert_eq!(backtracks, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn labs_land_in_contiguous_pairs() {
        let inst = instance(
            &[("K1", "F1", "L1", "C1"), ("K2", "F2", "S1", "C1")],
            &[("L1", 3, SubjectKind::Lab), ("S1", 4, SubjectKind::Theory)],
        );
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let TrialOutcome::Complete { assignment, .. } = run_trial(&d, 3, 1000, later()) else {
            panic!("expected a complete trial");
        };
        assert!(assignment.verify(&d).is_ok());
        let lab: Vec<_> = assignment
            .placements()
            .iter()
            .filter(|p| p.combo == 0)
            .collect();
        assert_eq!(lab.iter().filter(|p| p.shape == Shape::Pair).count(), 1);
        assert_eq!(lab.iter().filter(|p| p.shape == Shape::Single).count(), 1);
    }

    #[test]
    fn same_seed_same_trial() {
        let inst = instance(
            &[("K1", "F1", "S1", "C1"), ("K2", "F1", "S2", "C1")],
            &[("S1", 4, SubjectKind::Theory), ("S2", 3, SubjectKind::Theory)],
        );
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let a = run_trial(&d, 42, 100, later());
        let b = run_trial(&d, 42, 100, later());
        match (a, b) {
            (
                TrialOutcome::Complete { assignment: a, .. },
                TrialOutcome::Complete { assignment: b, .. },
            ) => assert_eq!(a.placements(), b.placements()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn passed_deadline_stops_a_long_search() {
        let inst = crate::testing::overloaded_faculty();
        let d = Domain::build(&inst, Grid::default()).unwrap();
        match run_trial(&d, 1, u32::MAX, Instant::now()) {
            TrialOutcome::TimedOut { backtracks } => assert_eq!(backtracks, CLOCK_EVERY),
            other => panic!("unexpected {other:?}"),
        }
    }
}
