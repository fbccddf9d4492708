use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use timetable_core::{OptimizeRequest, OptimizeResponse, Solver};
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: OptimizeResponse },
    Infeasible { reason: String, message: String },
    Failed { message: String },
}

/// Finished jobs kept by default before the oldest are forgotten.
pub const DEFAULT_RETAINED: usize = 1024;

#[derive(Default)]
struct Registry {
    statuses: HashMap<String, JobStatus>,
    finished: VecDeque<String>,
}

/// Optimize runs keyed by job id. Nothing survives a restart; storing the
/// chosen timetable is the caller's business. Only the most recent
/// `retained` finished jobs are remembered.
#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<Registry>>,
    solver: Arc<S>,
    retained: usize,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self::with_retention(solver, DEFAULT_RETAINED)
    }

    pub fn with_retention(solver: S, retained: usize) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
            retained: retained.max(1),
        }
    }

    pub fn enqueue(&self, req: OptimizeRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().statuses.insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let retained = self.retained;
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write().statuses.insert(id_for_task.clone(), JobStatus::Running);
            let status = match solver.optimize(req).await {
                Ok(res) if res.ok => JobStatus::Solved { result: res },
                Ok(res) => JobStatus::Infeasible {
                    reason: res.reason.unwrap_or_default(),
                    message: res.message.unwrap_or_default(),
                },
                Err(e) => {
                    error!(?e, job = %id_for_task, "job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            info!(job = %id_for_task, "job finished");

            let mut reg = map.write();
            reg.statuses.insert(id_for_task.clone(), status);
            reg.finished.push_back(id_for_task);
            while reg.finished.len() > retained {
                if let Some(old) = reg.finished.pop_front() {
                    debug!(job = %old, "forgetting finished job");
                    reg.statuses.remove(&old);
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().statuses.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Canned(bool);

    #[async_trait]
    impl Solver for Canned {
        async fn optimize(&self, _req: OptimizeRequest) -> anyhow::Result<OptimizeResponse> {
            if !self.0 {
                anyhow::bail!("solver unavailable");
            }
            Ok(OptimizeResponse {
                ok: false,
                best_class_timetables: None,
                best_faculty_timetables: None,
                best_score: None,
                reason: Some("no_feasible_assignment".into()),
                message: Some("no feasible assignment found in 4 trial(s)".into()),
                stats: serde_json::json!({}),
            })
        }
    }

    fn request() -> OptimizeRequest {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    async fn settle<S: Solver>(jobs: &InMemJobs<S>, id: &JobId) -> JobStatus {
        for _ in 0..100 {
            match jobs.get(&id.0) {
                Some(JobStatus::Queued) | Some(JobStatus::Running) => {
                    tokio::time::sleep(Duration::from_millis(5)).await
                }
                Some(s) => return s,
                None => panic!("job vanished"),
            }
        }
        panic!("job never finished");
    }

    #[tokio::test]
    async fn infeasible_result_keeps_its_reason() {
        let jobs = InMemJobs::new(Canned(true));
        let id = jobs.enqueue(request());
        match settle(&jobs, &id).await {
            JobStatus::Infeasible { reason, .. } => assert_eq!(reason, "no_feasible_assignment"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn solver_error_marks_job_failed() {
        let jobs = InMemJobs::new(Canned(false));
        let id = jobs.enqueue(request());
        assert!(matches!(settle(&jobs, &id).await, JobStatus::Failed { .. }));
        assert!(jobs.get("missing").is_none());
    }

    #[tokio::test]
    async fn oldest_finished_jobs_are_forgotten() {
        let jobs = InMemJobs::with_retention(Canned(true), 2);
        let first = jobs.enqueue(request());
        settle(&jobs, &first).await;
        let second = jobs.enqueue(request());
        settle(&jobs, &second).await;
        let third = jobs.enqueue(request());
        settle(&jobs, &third).await;

        assert!(jobs.get(&first.0).is_none());
        assert!(jobs.get(&second.0).is_some());
        assert!(jobs.get(&third.0).is_some());
    }
}
