use crate::constraints::{Occupancy, Placement, Shape};
use crate::domain::Domain;
use crate::error::EngineError;
use types::SubjectKind;

/// Committed placements plus the occupancy they induce. Pinned placements
/// come first and are never popped.
#[derive(Clone, Debug)]
pub struct Assignment {
    placements: Vec<Placement>,
    occupancy: Occupancy,
    pinned: usize,
}

impl Assignment {
    pub fn with_pins(domain: &Domain) -> Self {
        Self {
            placements: domain.pinned.clone(),
            occupancy: domain.pinned_occupancy(),
            pinned: domain.pinned.len(),
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn can_place(&self, domain: &Domain, combo: usize, day: u8, hour: u8, shape: Shape) -> bool {
        self.occupancy.can_place(domain, combo, day, hour, shape)
    }

    /// Commits a placement the caller has already checked with `can_place`.
    pub fn push(&mut self, domain: &Domain, p: Placement) {
        self.occupancy.occupy(domain, &p);
        self.placements.push(p);
    }

    /// Undoes the most recent search placement. Pins are out of reach.
    pub fn pop(&mut self, domain: &Domain) -> Option<Placement> {
        if self.placements.len() <= self.pinned {
            return None;
        }
        let p = self.placements.pop()?;
        self.occupancy.release(domain, &p);
        Some(p)
    }

    pub fn hours_for(&self, combo: usize) -> u32 {
        self.placements
            .iter()
            .filter(|p| p.combo == combo)
            .map(|p| p.shape.len() as u32)
            .sum()
    }

    /// Re-derives every hard invariant from scratch. A failure here is a
    /// defect in the search, not an infeasible input.
    pub fn verify(&self, domain: &Domain) -> Result<(), EngineError> {
        let mut occ = Occupancy::new(domain.grid, domain.classes.len(), domain.faculties.len());
        for p in &self.placements {
            let c = &domain.combos[p.combo];
            if !occ.can_place(domain, p.combo, p.day, p.hour, p.shape) {
                return Err(EngineError::Internal(format!(
                    "combo {} at day {} hour {} overlaps or leaves the grid",
                    c.id, p.day, p.hour
                )));
            }
            occ.occupy(domain, p);
        }

        for (k, c) in domain.combos.iter().enumerate() {
            let got = self.hours_for(k);
            if got != c.weekly_hours {
                return Err(EngineError::Internal(format!(
                    "combo {} has {got} of {} hours",
                    c.id, c.weekly_hours
                )));
            }
            let singles = self
                .placements
                .iter()
                .filter(|p| p.combo == k && p.shape == Shape::Single)
                .count();
            let bad_shape = match c.kind {
                SubjectKind::Theory => singles as u32 != c.weekly_hours,
                SubjectKind::Lab => singles as u32 != c.weekly_hours % 2,
            };
            if bad_shape {
                return Err(EngineError::Internal(format!(
                    "combo {} has a broken block shape",
                    c.id
                )));
            }
        }

        for fs in &domain.fixed_slots {
            let held = self.placements.iter().any(|p| {
                p.fixed && domain.combos[p.combo].id == fs.combo_id && p.covers(fs.day, fs.hour)
            });
            if !held {
                return Err(EngineError::Internal(format!(
                    "fixed slot {} at day {} hour {} is missing",
                    fs.combo_id, fs.day, fs.hour
                )));
            }
        }
        Ok(())
    }
}
