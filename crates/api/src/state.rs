use std::sync::Arc;

use jobs::InMemJobs;
use timetable_search::TimetableEngine;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TimetableEngine>,
    pub jobs: Arc<InMemJobs<TimetableEngine>>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let engine = TimetableEngine::new(config.search.clone());
        Self {
            jobs: Arc::new(InMemJobs::with_retention(engine.clone(), config.jobs_retained)),
            engine: Arc::new(engine),
        }
    }
}
