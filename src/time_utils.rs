use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Timezone used for report dates and dashboard times. Accepts IANA names
/// (`Europe/London`), `UTC`/`GMT` and fixed offsets such as `UTC+01:00`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportTimezone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for ReportTimezone {
    fn default() -> Self {
        ReportTimezone::Named(chrono_tz::Europe::London)
    }
}

impl fmt::Display for ReportTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportTimezone::Named(tz) => write!(f, "{}", tz.name()),
            ReportTimezone::Fixed(offset) => write!(f, "UTC{}", offset),
        }
    }
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() || !rest.is_ascii() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub fn parse_timezone(raw: &str) -> Option<ReportTimezone> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    if upper == "UTC" || upper == "GMT" {
        return FixedOffset::east_opt(0).map(ReportTimezone::Fixed);
    }
    if let Some(offset) = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
    {
        return parse_fixed_offset(offset).map(ReportTimezone::Fixed);
    }

    trimmed.parse::<Tz>().ok().map(ReportTimezone::Named)
}

impl ReportTimezone {
    pub fn local_date(&self, utc_dt: DateTime<Utc>) -> NaiveDate {
        match self {
            ReportTimezone::Named(tz) => utc_dt.with_timezone(tz).date_naive(),
            ReportTimezone::Fixed(offset) => utc_dt.with_timezone(offset).date_naive(),
        }
    }

    /// `2024-03-05 09:07` in local time.
    pub fn format_local_time(&self, utc_dt: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M";
        match self {
            ReportTimezone::Named(tz) => utc_dt.with_timezone(tz).format(FORMAT).to_string(),
            ReportTimezone::Fixed(offset) => {
                utc_dt.with_timezone(offset).format(FORMAT).to_string()
            }
        }
    }
}
