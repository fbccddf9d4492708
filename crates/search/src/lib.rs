pub mod optimizer;
pub mod search;

use std::sync::Arc;

use async_trait::async_trait;
use timetable_core::projection::{class_timetables, faculty_timetables};
use timetable_core::{
    Domain, EngineError, GenerateRequest, GenerateResponse, OptimizeRequest, OptimizeResponse,
    SearchParams, Solver,
};
use tracing::{info, warn};

pub use optimizer::{generate, optimize, trial_seed, Run, RunStats, Solved};
pub use search::{run_trial, TrialOutcome};

fn stats_json(stats: &RunStats, solved: Option<&Solved>) -> serde_json::Value {
    let mut v = serde_json::to_value(stats).unwrap_or_default();
    v["method"] = serde_json::json!("backtracking");
    if let Some(s) = solved {
        v["best_trial"] = serde_json::json!(s.trial);
        v["seed"] = serde_json::json!(s.seed);
        v["penalties"] = serde_json::json!({
            "uneven_spread": s.scores.uneven_spread,
            "faculty_gaps": s.scores.faculty_gaps,
            "class_gaps": s.scores.class_gaps,
            "back_to_back_labs": s.scores.back_to_back_labs,
        });
    }
    v
}

fn generate_failure(e: &EngineError, stats: serde_json::Value) -> GenerateResponse {
    GenerateResponse {
        ok: false,
        class_timetables: None,
        faculty_timetables: None,
        score: None,
        reason: Some(e.reason().to_string()),
        message: Some(e.to_string()),
        stats,
    }
}

fn optimize_failure(e: &EngineError, stats: serde_json::Value) -> OptimizeResponse {
    OptimizeResponse {
        ok: false,
        best_class_timetables: None,
        best_faculty_timetables: None,
        best_score: None,
        reason: Some(e.reason().to_string()),
        message: Some(e.to_string()),
        stats,
    }
}

/// Entry points for callers holding raw entity collections.
#[derive(Clone, Debug, Default)]
pub struct TimetableEngine {
    defaults: SearchParams,
}

impl TimetableEngine {
    pub fn new(defaults: SearchParams) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &SearchParams {
        &self.defaults
    }

    /// Sequential, first-feasible generation.
    pub fn generate(&self, req: &GenerateRequest) -> GenerateResponse {
        let params = req.params.as_ref().unwrap_or(&self.defaults);
        let domain = match Domain::build(&req.instance, req.grid) {
            Ok(d) => d,
            Err(e) => {
                warn!(reason = e.reason(), error = %e, "generate rejected");
                return generate_failure(&e, serde_json::json!({"method": "backtracking"}));
            }
        };

        let run = generate(&domain, params);
        match run.best {
            Ok(solved) => {
                info!(
                    trial = solved.trial,
                    score = solved.scores.score,
                    "generate finished"
                );
                GenerateResponse {
                    ok: true,
                    class_timetables: Some(class_timetables(&domain, &solved.assignment)),
                    faculty_timetables: Some(faculty_timetables(&domain, &solved.assignment)),
                    score: Some(solved.scores.score),
                    reason: None,
                    message: None,
                    stats: stats_json(&run.stats, Some(&solved)),
                }
            }
            Err(e) => {
                warn!(reason = e.reason(), error = %e, "generate failed");
                generate_failure(&e, stats_json(&run.stats, None))
            }
        }
    }

    /// Parallel best-of-N generation.
    pub async fn optimize_request(&self, req: OptimizeRequest) -> OptimizeResponse {
        let params = req.params.clone().unwrap_or_else(|| self.defaults.clone());
        let domain = match Domain::build(&req.instance, req.grid) {
            Ok(d) => Arc::new(d),
            Err(e) => {
                warn!(reason = e.reason(), error = %e, "optimize rejected");
                return optimize_failure(&e, serde_json::json!({"method": "backtracking"}));
            }
        };

        let run = optimize(Arc::clone(&domain), &params).await;
        match run.best {
            Ok(solved) => OptimizeResponse {
                ok: true,
                best_class_timetables: Some(class_timetables(&domain, &solved.assignment)),
                best_faculty_timetables: Some(faculty_timetables(&domain, &solved.assignment)),
                best_score: Some(solved.scores.score),
                reason: None,
                message: None,
                stats: stats_json(&run.stats, Some(&solved)),
            },
            Err(e) => {
                warn!(reason = e.reason(), error = %e, "optimize failed");
                optimize_failure(&e, stats_json(&run.stats, None))
            }
        }
    }
}

#[async_trait]
impl Solver for TimetableEngine {
    async fn optimize(&self, req: OptimizeRequest) -> anyhow::Result<OptimizeResponse> {
        Ok(self.optimize_request(req).await)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use types::{Class, Combo, Faculty, Instance, Subject, SubjectKind};

    /// Combos as (id, faculty, subject, class); faculties and classes are
    /// created on first mention.
    pub fn instance(combos: &[(&str, &str, &str, &str)], subjects: &[(&str, u32, SubjectKind)]) -> Instance {
        let mut inst = Instance::default();
        inst.subjects = subjects
            .iter()
            .map(|&(id, hours, kind)| Subject {
                id: id.into(),
                name: id.into(),
                sem: 1,
                weekly_hours: hours,
                kind,
            })
            .collect();
        for &(id, f, s, c) in combos {
            if !inst.faculties.iter().any(|x| x.id.0 == f) {
                inst.faculties.push(Faculty {
                    id: f.into(),
                    name: f.into(),
                });
            }
            if !inst.classes.iter().any(|x| x.id.0 == c) {
                inst.classes.push(Class {
                    id: c.into(),
                    name: c.into(),
                    sem: 1,
                    section: String::new(),
                    days_per_week: None,
                    combos: vec![],
                    total_class_hours: None,
                });
            }
            inst.combos.push(Combo {
                id: id.into(),
                name: String::new(),
                faculty_id: f.into(),
                subject_id: s.into(),
                class_id: c.into(),
            });
        }
        inst
    }

    /// Six classes that all need the same faculty for eight hours: more
    /// teaching than a 5x9 week holds, though every class fits on its own.
    pub fn overloaded_faculty() -> Instance {
        let combos: Vec<(String, String)> = (0..6)
            .map(|i| (format!("K{i}"), format!("C{i}")))
            .collect();
        let refs: Vec<(&str, &str, &str, &str)> = combos
            .iter()
            .map(|(k, c)| (k.as_str(), "F1", "S1", c.as_str()))
            .collect();
        instance(&refs, &[("S1", 8, SubjectKind::Theory)])
    }
}
