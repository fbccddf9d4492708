//! Hard constraints: demand shapes, placements and per-slot occupancy.

use std::ops::Range;

use types::{Grid, SubjectKind};

use crate::domain::Domain;

/// How many contiguous hours one demand unit takes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Shape {
    Single,
    Pair,
}

impl Shape {
    pub fn len(self) -> u8 {
        match self {
            Shape::Single => 1,
            Shape::Pair => 2,
        }
    }
}

/// Splits a weekly hour count into placement units. Labs go in pairs with at
/// most one trailing single when the count is odd.
pub fn demand_shapes(kind: SubjectKind, hours: u32) -> Vec<Shape> {
    match kind {
        SubjectKind::Theory => vec![Shape::Single; hours as usize],
        SubjectKind::Lab => {
            let mut v = vec![Shape::Pair; (hours / 2) as usize];
            if hours % 2 == 1 {
                v.push(Shape::Single);
            }
            v
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Placement {
    pub combo: usize,
    pub day: u8,
    pub hour: u8,
    pub shape: Shape,
    pub fixed: bool,
}

impl Placement {
    pub fn hours(&self) -> Range<u8> {
        self.hour..self.hour + self.shape.len()
    }

    pub fn end(&self) -> u8 {
        self.hour + self.shape.len()
    }

    pub fn covers(&self, day: u8, hour: u8) -> bool {
        self.day == day && self.hours().contains(&hour)
    }
}

/// Start coordinates a unit of `shape` may legally use for `combo`, before
/// looking at what is already occupied.
pub fn candidate_starts(domain: &Domain, combo: usize, shape: Shape) -> Vec<(u8, u8)> {
    let class = &domain.classes[domain.combos[combo].class];
    let hours = domain.grid.hours_per_day;
    let len = shape.len();
    let mut out = Vec::new();
    if len > hours {
        return out;
    }
    for d in 0..class.days {
        for h in 0..=(hours - len) {
            out.push((d, h));
        }
    }
    out
}

/// Which combo holds each (class, slot) and each (faculty, slot).
#[derive(Clone, Debug)]
pub struct Occupancy {
    hours: usize,
    cells: usize,
    class: Vec<Option<usize>>,
    faculty: Vec<Option<usize>>,
}

impl Occupancy {
    pub fn new(grid: Grid, classes: usize, faculties: usize) -> Self {
        let cells = grid.slots();
        Self {
            hours: grid.hours_per_day as usize,
            cells,
            class: vec![None; classes * cells],
            faculty: vec![None; faculties * cells],
        }
    }

    fn cell(&self, day: u8, hour: u8) -> usize {
        day as usize * self.hours + hour as usize
    }

    pub fn class_at(&self, class: usize, day: u8, hour: u8) -> Option<usize> {
        self.class[class * self.cells + self.cell(day, hour)]
    }

    pub fn faculty_at(&self, faculty: usize, day: u8, hour: u8) -> Option<usize> {
        self.faculty[faculty * self.cells + self.cell(day, hour)]
    }

    /// Day bound, hour bound and class/faculty exclusivity for every hour the
    /// unit would cover.
    pub fn can_place(&self, domain: &Domain, combo: usize, day: u8, hour: u8, shape: Shape) -> bool {
        let c = &domain.combos[combo];
        if day >= domain.classes[c.class].days {
            return false;
        }
        if hour as u16 + shape.len() as u16 > domain.grid.hours_per_day as u16 {
            return false;
        }
        (hour..hour + shape.len()).all(|h| {
            self.class_at(c.class, day, h).is_none() && self.faculty_at(c.faculty, day, h).is_none()
        })
    }

    pub fn occupy(&mut self, domain: &Domain, p: &Placement) {
        self.set(domain, p, Some(p.combo));
    }

    pub fn release(&mut self, domain: &Domain, p: &Placement) {
        self.set(domain, p, None);
    }

    fn set(&mut self, domain: &Domain, p: &Placement, value: Option<usize>) {
        let c = &domain.combos[p.combo];
        for h in p.hours() {
            let k = self.cell(p.day, h);
            self.class[c.class * self.cells + k] = value;
            self.faculty[c.faculty * self.cells + k] = value;
        }
    }
}
