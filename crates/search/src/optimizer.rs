use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use timetable_core::scoring::{compute_scores, Scores};
use timetable_core::{Assignment, Domain, EngineError, SearchParams};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::search::{run_trial, TrialOutcome};

/// Seed for trial `trial` of a run seeded with `base`.
pub fn trial_seed(base: u64, trial: u32) -> u64 {
    base ^ (trial as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Clone, Debug)]
pub struct Solved {
    pub assignment: Assignment,
    pub scores: Scores,
    pub trial: u32,
    pub seed: u64,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct RunStats {
    pub trials_run: u32,
    pub trials_complete: u32,
    pub backtracks: u64,
    pub timed_out: bool,
}

#[derive(Debug)]
pub struct Run {
    pub best: Result<Solved, EngineError>,
    pub stats: RunStats,
}

fn finish(domain: &Domain, trial: u32, seed: u64, assignment: Assignment) -> Result<Solved, EngineError> {
    assignment.verify(domain)?;
    let scores = compute_scores(domain, &assignment);
    Ok(Solved {
        assignment,
        scores,
        trial,
        seed,
    })
}

/// Higher score wins; equal scores go to the earlier trial so the result
/// does not depend on completion order.
fn better(best: Option<Solved>, cand: Solved) -> Solved {
    match best {
        Some(b)
            if b.scores.score > cand.scores.score
                || (b.scores.score == cand.scores.score && b.trial < cand.trial) =>
        {
            b
        }
        _ => cand,
    }
}

fn bounded(params: &SearchParams) -> SearchParams {
    let p = params.clamped();
    if &p != params {
        warn!(
            trials = p.trial_count,
            attempts = p.generate_attempts,
            budget = p.backtrack_budget,
            time_limit_ms = p.time_limit_ms,
            "search params held to service ceilings"
        );
    }
    p
}

/// Runs seeded trials one after another and keeps the first complete one.
pub fn generate(domain: &Domain, params: &SearchParams) -> Run {
    let params = bounded(params);
    let attempts = params.generate_attempts;
    let deadline = Instant::now() + Duration::from_millis(params.time_limit_ms);
    let mut stats = RunStats::default();

    for t in 0..attempts {
        if t > 0 && Instant::now() >= deadline {
            stats.timed_out = true;
            break;
        }
        let seed = trial_seed(params.seed, t);
        stats.trials_run += 1;
        match run_trial(domain, seed, params.backtrack_budget, deadline) {
            TrialOutcome::Complete {
                assignment,
                backtracks,
            } => {
                stats.trials_complete += 1;
                stats.backtracks += backtracks as u64;
                debug!(trial = t, seed, backtracks, "generate attempt complete");
                return Run {
                    best: finish(domain, t, seed, assignment),
                    stats,
                };
            }
            TrialOutcome::Infeasible {
                backtracks,
                exhausted,
            } => {
                stats.backtracks += backtracks as u64;
                debug!(trial = t, seed, backtracks, exhausted, "generate attempt failed");
                if exhausted {
                    break;
                }
            }
            TrialOutcome::TimedOut { backtracks } => {
                stats.backtracks += backtracks as u64;
                stats.timed_out = true;
                break;
            }
        }
    }

    Run {
        best: Err(EngineError::NoFeasibleAssignment {
            trials: stats.trials_run,
        }),
        stats,
    }
}

/// Runs `trial_count` independent trials on the blocking pool and folds
/// them into the best-scoring complete one. On hitting the wall-clock limit
/// whatever has finished so far is used.
pub async fn optimize(domain: Arc<Domain>, params: &SearchParams) -> Run {
    let params = bounded(params);
    let trials = params.trial_count;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(params.time_limit_ms);

    let mut set = JoinSet::new();
    for t in 0..trials {
        let domain = Arc::clone(&domain);
        let seed = trial_seed(params.seed, t);
        let budget = params.backtrack_budget;
        let until = deadline.into_std();
        set.spawn_blocking(move || (t, seed, run_trial(&domain, seed, budget, until)));
    }

    let mut stats = RunStats::default();
    let mut best: Option<Solved> = None;
    let mut defect: Option<EngineError> = None;

    loop {
        match tokio::time::timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((t, seed, outcome)))) => {
                stats.trials_run += 1;
                match outcome {
                    TrialOutcome::Complete {
                        assignment,
                        backtracks,
                    } => {
                        stats.trials_complete += 1;
                        stats.backtracks += backtracks as u64;
                        match finish(&domain, t, seed, assignment) {
                            Ok(solved) => {
                                debug!(trial = t, score = solved.scores.score, "trial complete");
                                best = Some(better(best, solved));
                            }
                            Err(e) => defect = Some(e),
                        }
                    }
                    TrialOutcome::Infeasible {
                        backtracks,
                        exhausted,
                    } => {
                        stats.backtracks += backtracks as u64;
                        debug!(trial = t, backtracks, exhausted, "trial infeasible");
                    }
                    TrialOutcome::TimedOut { backtracks } => {
                        stats.backtracks += backtracks as u64;
                        stats.timed_out = true;
                    }
                }
            }
            Ok(Some(Err(e))) => {
                defect = Some(EngineError::Internal(format!("trial task failed: {e}")));
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    finished = stats.trials_run,
                    trials, "time limit reached, using trials finished so far"
                );
                stats.timed_out = true;
                set.abort_all();
                break;
            }
        }
    }

    info!(
        trials_run = stats.trials_run,
        complete = stats.trials_complete,
        best = best.as_ref().map(|b| b.scores.score),
        "optimize finished"
    );

    let best = match (defect, best) {
        (Some(e), _) => Err(e),
        (None, Some(b)) => Ok(b),
        (None, None) => Err(EngineError::NoFeasibleAssignment {
            trials: stats.trials_run,
        }),
    };
    Run { best, stats }
}
