use std::collections::BTreeMap;

use types::SubjectKind;

use crate::assignment::Assignment;
use crate::constraints::Occupancy;
use crate::domain::Domain;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scores {
    pub uneven_spread: i64,
    pub faculty_gaps: i64,
    pub class_gaps: i64,
    pub back_to_back_labs: i64,
    pub faculty_gaps_by_id: BTreeMap<String, i64>,
    pub penalty: f64,
    /// Negated penalty; 0.0 is a perfect schedule.
    pub score: f64,
}

/// Empty hours strictly between the first and last busy hour of each day.
fn idle_gaps(days: u8, hours: u8, busy: impl Fn(u8, u8) -> bool) -> i64 {
    let mut total = 0i64;
    for d in 0..days {
        let occupied: Vec<u8> = (0..hours).filter(|&h| busy(d, h)).collect();
        if let (Some(&first), Some(&last)) = (occupied.first(), occupied.last()) {
            total += (last - first + 1) as i64 - occupied.len() as i64;
        }
    }
    total
}

fn uneven_spread(domain: &Domain, assignment: &Assignment) -> i64 {
    let mut total = 0i64;
    for (k, c) in domain.combos.iter().enumerate() {
        let days = domain.classes[c.class].days as usize;
        let mut per_day = vec![0i64; days];
        for p in assignment.placements().iter().filter(|p| p.combo == k) {
            per_day[p.day as usize] += 1;
        }
        let units: i64 = per_day.iter().sum();
        if units == 0 {
            continue;
        }
        let ideal = (units + days as i64 - 1) / days as i64;
        total += per_day.iter().map(|&n| (n - ideal).max(0)).sum::<i64>();
    }
    total
}

fn back_to_back_labs(domain: &Domain, assignment: &Assignment) -> i64 {
    let mut total = 0i64;
    for ci in 0..domain.classes.len() {
        let mut labs: Vec<_> = assignment
            .placements()
            .iter()
            .filter(|p| {
                let c = &domain.combos[p.combo];
                c.class == ci && c.kind == SubjectKind::Lab
            })
            .collect();
        labs.sort_by_key(|p| (p.day, p.hour));
        total += labs
            .windows(2)
            .filter(|w| w[0].combo != w[1].combo && w[0].day == w[1].day && w[0].end() == w[1].hour)
            .count() as i64;
    }
    total
}

/// Soft-constraint penalties for a finished assignment. Pure and
/// deterministic.
pub fn compute_scores(domain: &Domain, assignment: &Assignment) -> Scores {
    let occ: &Occupancy = assignment.occupancy();
    let hours = domain.grid.hours_per_day;

    let mut faculty_gaps_by_id = BTreeMap::new();
    for (fi, f) in domain.faculties.iter().enumerate() {
        let g = idle_gaps(domain.grid.days_per_week, hours, |d, h| {
            occ.faculty_at(fi, d, h).is_some()
        });
        if g != 0 {
            faculty_gaps_by_id.insert(f.id.0.clone(), g);
        }
    }
    let faculty_gaps: i64 = faculty_gaps_by_id.values().sum();

    let class_gaps: i64 = domain
        .classes
        .iter()
        .enumerate()
        .map(|(ci, c)| idle_gaps(c.days, hours, |d, h| occ.class_at(ci, d, h).is_some()))
        .sum();

    let uneven = uneven_spread(domain, assignment);
    let labs = back_to_back_labs(domain, assignment);

    let w = &domain.weights;
    let penalty = w.uneven_spread as f64 * uneven as f64
        + w.faculty_gaps as f64 * faculty_gaps as f64
        + w.class_gaps as f64 * class_gaps as f64
        + w.back_to_back_labs as f64 * labs as f64;

    Scores {
        uneven_spread: uneven,
        faculty_gaps,
        class_gaps,
        back_to_back_labs: labs,
        faculty_gaps_by_id,
        penalty,
        score: 0.0 - penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Placement, Shape};
    use crate::fixtures::*;
    use types::Grid;

    fn place(a: &mut Assignment, d: &Domain, combo: usize, day: u8, hour: u8, shape: Shape) {
        assert!(a.can_place(d, combo, day, hour, shape));
        a.push(
            d,
            Placement {
                combo,
                day,
                hour,
                shape,
                fixed: false,
            },
        );
    }

    #[test]
    fn spread_out_compact_schedule_scores_zero() {
        let inst = instance(&[("K1", "F1", "S1", "C1")], &[("S1", 3, SubjectKind::Theory)]);
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let mut a = Assignment::with_pins(&d);
        for day in 0..3 {
            place(&mut a, &d, 0, day, 0, Shape::Single);
        }
        let s = compute_scores(&d, &a);
        assert_eq!(s.penalty, 0.0);
        assert_eq!(s.score, 0.0);
        assert!(s.score.is_sign_positive());
    }

    #[test]
    fn stacking_one_day_and_gaps_are_penalised() {
        let inst = instance(&[("K1", "F1", "S1", "C1")], &[("S1", 3, SubjectKind::Theory)]);
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let mut a = Assignment::with_pins(&d);
        place(&mut a, &d, 0, 0, 0, Shape::Single);
        place(&mut a, &d, 0, 0, 2, Shape::Single);
        place(&mut a, &d, 0, 0, 4, Shape::Single);
        let s = compute_scores(&d, &a);
        // ceil(3/5) = 1 per day, three on Monday
        assert_eq!(s.uneven_spread, 2);
        assert_eq!(s.faculty_gaps, 2);
        assert_eq!(s.class_gaps, 2);
        assert_eq!(s.faculty_gaps_by_id.get("F1"), Some(&2));
        let w = &d.weights;
        let expected = (2 * w.uneven_spread + 2 * w.faculty_gaps + 2 * w.class_gaps) as f64;
        assert_eq!(s.penalty, expected);
        assert_eq!(s.score, -expected);
    }

    #[test]
    fn adjacent_lab_blocks_count_once() {
        let inst = instance(
            &[("K1", "F1", "L1", "C1"), ("K2", "F2", "L2", "C1")],
            &[("L1", 2, SubjectKind::Lab), ("L2", 2, SubjectKind::Lab)],
        );
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let mut a = Assignment::with_pins(&d);
        place(&mut a, &d, 0, 1, 0, Shape::Pair);
        place(&mut a, &d, 1, 1, 2, Shape::Pair);
        assert_eq!(compute_scores(&d, &a).back_to_back_labs, 1);
    }

    #[test]
    fn one_lab_pair_and_its_odd_hour_are_a_single_block() {
        let inst = instance(&[("K1", "F1", "L1", "C1")], &[("L1", 3, SubjectKind::Lab)]);
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let mut a = Assignment::with_pins(&d);
        place(&mut a, &d, 0, 2, 0, Shape::Pair);
        place(&mut a, &d, 0, 2, 2, Shape::Single);
        assert_eq!(compute_scores(&d, &a).back_to_back_labs, 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let inst = instance(&[("K1", "F1", "S1", "C1")], &[("S1", 2, SubjectKind::Theory)]);
        let d = Domain::build(&inst, Grid::default()).unwrap();
        let mut a = Assignment::with_pins(&d);
        place(&mut a, &d, 0, 2, 1, Shape::Single);
        place(&mut a, &d, 0, 2, 5, Shape::Single);
        assert_eq!(compute_scores(&d, &a), compute_scores(&d, &a));
    }
}
