use crate::db::store::RetryPolicy;
use crate::pipeline::rules::{RuleError, RuleSet};
use crate::pipeline::suggestions::DEFAULT_LIMIT;
use crate::time_utils::{self, ReportTimezone};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{name} has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
    #[error("failed to load suggestion rules from {path}: {source}")]
    Rules {
        path: PathBuf,
        #[source]
        source: RuleError,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub fetch_retry: RetryPolicy,
    pub suggestion_limit: usize,
    pub rules: RuleSet,
    pub timezone: ReportTimezone,
    /// Submissions accepted per client IP per minute.
    pub submission_rate_limit: usize,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| {
            let port = var("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port.trim())
        });

        let rules = match var("SUGGESTION_RULES_PATH") {
            Some(path) => {
                let path = PathBuf::from(path);
                let rules = RuleSet::from_json_file(&path)
                    .map_err(|source| ConfigError::Rules { path: path.clone(), source })?;
                tracing::info!("Loaded {} suggestion rule(s) from {}", rules.rules.len(), path.display());
                rules
            }
            None => RuleSet::builtin().clone(),
        };

        let timezone = match var("REPORT_TIMEZONE") {
            Some(raw) => time_utils::parse_timezone(&raw).ok_or(ConfigError::Invalid {
                name: "REPORT_TIMEZONE",
                value: raw,
            })?,
            None => ReportTimezone::default(),
        };

        let fetch_retry = RetryPolicy {
            attempts: parse_number(var("FETCH_RETRY_ATTEMPTS"), "FETCH_RETRY_ATTEMPTS", 3, 1)?,
            ..RetryPolicy::default()
        };

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections: parse_number(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10, 1)?,
            fetch_retry,
            suggestion_limit: parse_number(var("SUGGESTION_LIMIT"), "SUGGESTION_LIMIT", DEFAULT_LIMIT, 1)?,
            rules,
            timezone,
            submission_rate_limit: parse_number(
                var("SUBMISSION_RATE_LIMIT"),
                "SUBMISSION_RATE_LIMIT",
                20,
                1,
            )?,
            seed_demo_data: parse_flag(var("SEED_DEMO_DATA"), "SEED_DEMO_DATA")?,
        })
    }
}

fn parse_number<T>(
    raw: Option<String>,
    name: &'static str,
    default: T,
    min: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value >= min => Ok(value),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}

fn parse_flag(raw: Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}
