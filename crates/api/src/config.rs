use anyhow::Context;
use std::str::FromStr;
use types::SearchParams;

/// Service settings, read once from `TIMETABLE__*` environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub log_json: bool,
    pub jobs_retained: usize,
    pub search: SearchParams,
}

fn var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let d = SearchParams::default();
        Ok(Self {
            port: var(&lookup, "TIMETABLE__SERVER__PORT", 8080)?,
            log_json: var(&lookup, "TIMETABLE__LOG__JSON", true)?,
            jobs_retained: var(&lookup, "TIMETABLE__JOBS__RETAINED", jobs::DEFAULT_RETAINED)?,
            search: SearchParams {
                trial_count: var(&lookup, "TIMETABLE__SEARCH__TRIALS", d.trial_count)?,
                seed: var(&lookup, "TIMETABLE__SEARCH__SEED", d.seed)?,
                backtrack_budget: var(&lookup, "TIMETABLE__SEARCH__BACKTRACK_BUDGET", d.backtrack_budget)?,
                time_limit_ms: var(&lookup, "TIMETABLE__SEARCH__TIME_LIMIT_MS", d.time_limit_ms)?,
                generate_attempts: var(&lookup, "TIMETABLE__SEARCH__GENERATE_ATTEMPTS", d.generate_attempts)?,
            },
        })
    }
}
