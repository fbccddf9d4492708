pub mod assignment;
pub mod constraints;
pub mod domain;
pub mod error;
pub mod projection;
pub mod scoring;

use async_trait::async_trait;

pub use assignment::Assignment;
pub use constraints::{Occupancy, Placement, Shape};
pub use domain::Domain;
pub use error::{EngineError, ValidationError};
pub use types::{
    Class, Combo, Faculty, FixedSlot, GenerateRequest, GenerateResponse, Grid, Instance,
    OptimizeRequest, OptimizeResponse, SearchParams, Subject,
};

/// Builds the domain and discards it; used to vet input without searching.
pub fn validate(inst: &Instance, grid: Grid) -> Result<(), EngineError> {
    Domain::build(inst, grid).map(|_| ())
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn optimize(&self, req: OptimizeRequest) -> anyhow::Result<OptimizeResponse>;
}
