use crate::pipeline::normalize::NormalizedSubmission;
use crate::pipeline::rules::Priority;
use crate::time_utils::ReportTimezone;
use serde::Serialize;

pub const RECENT_ENTRIES: usize = 4;
pub const MAX_ALERTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEntry {
    pub role: String,
    pub location: String,
    pub status: &'static str,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub priority: Priority,
    pub message: String,
}

/// Newest entries first, assuming `records` is in store order.
pub fn recent_entries(records: &[NormalizedSubmission], tz: &ReportTimezone) -> Vec<RecentEntry> {
    records
        .iter()
        .take(RECENT_ENTRIES)
        .map(|record| RecentEntry {
            role: record.role.clone(),
            location: record.nursery_or("Unknown").to_string(),
            status: "complete",
            time: tz.format_local_time(record.submitted_at),
        })
        .collect()
}

pub fn alerts(records: &[NormalizedSubmission]) -> Vec<Alert> {
    records
        .iter()
        .flat_map(alerts_for)
        .take(MAX_ALERTS)
        .collect()
}

fn alerts_for(record: &NormalizedSubmission) -> Vec<Alert> {
    let name = record.full_name.as_str();
    let responses = &record.data.responses;
    let mut out = Vec::new();

    if record.response("safeguarding_concerns") == Some("yes") {
        out.push(Alert {
            priority: Priority::High,
            message: format!("Safeguarding concern reported by {name}"),
        });
    }
    if responses
        .iter()
        .any(|(key, value)| key.contains("absences") && !value.trim().is_empty())
    {
        out.push(Alert {
            priority: Priority::Medium,
            message: format!("Staff absences reported by {name}"),
        });
    }
    if responses
        .iter()
        .any(|(key, value)| key.contains("ratio_status") && value == "Incorrect Ratio")
    {
        out.push(Alert {
            priority: Priority::High,
            message: format!("Incorrect staff ratios reported by {name}"),
        });
    }
    if record.response("fire_safety_check") == Some("no") {
        out.push(Alert {
            priority: Priority::High,
            message: format!("Fire safety check failed - {name}"),
        });
    }
    if record.response("first_aid_certified") == Some("no") {
        out.push(Alert {
            priority: Priority::High,
            message: format!("First aid certification missing - {name}"),
        });
    }
    out
}
