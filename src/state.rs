use crate::config::AppConfig;
use crate::db::store::SubmissionStore;
use crate::middleware::RateLimiter;
use crate::pipeline::rules::RuleSet;
use crate::time_utils::ReportTimezone;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub rules: Arc<RuleSet>,
    pub suggestion_limit: usize,
    pub timezone: ReportTimezone,
    pub submission_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>, config: &AppConfig) -> Self {
        Self {
            store,
            rules: Arc::new(config.rules.clone()),
            suggestion_limit: config.suggestion_limit,
            timezone: config.timezone,
            submission_limiter: RateLimiter::per_minute(config.submission_rate_limit),
        }
    }
}

pub type SharedState = Arc<AppState>;
