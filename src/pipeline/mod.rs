//! Submission aggregation: normalize stored rows once, then derive the
//! compliance summary, suggestions and activity feed from the same records.
pub mod activity;
pub mod compliance;
pub mod export;
pub mod formatting;
pub mod normalize;
pub mod rules;
pub mod suggestions;

use crate::domain::models::Submission;
use crate::time_utils::ReportTimezone;
use activity::{Alert, RecentEntry};
use chrono::{DateTime, Utc};
use compliance::ComplianceSummary;
use normalize::PayloadStatus;
use rules::{RuleSet, Suggestion};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    Ready,
    NoData,
    /// Some rows were recovered from bad payloads or the rules were unusable.
    Partial,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub status: DashboardStatus,
    pub total_submissions: usize,
    pub compliance: ComplianceSummary,
    pub suggestions: Vec<Suggestion>,
    pub skipped_records: usize,
    pub alerts: Vec<Alert>,
    pub recent_entries: Vec<RecentEntry>,
    pub generated_at: DateTime<Utc>,
}

pub fn build_dashboard(
    rows: &[Submission],
    rules: &RuleSet,
    suggestion_limit: usize,
    tz: &ReportTimezone,
) -> DashboardSnapshot {
    let records = normalize::normalize_all(rows);
    let compliance = compliance::summarize(&records);
    let report = suggestions::generate(&records, rules, suggestion_limit);
    let recovered = records
        .iter()
        .filter(|record| record.status == PayloadStatus::Recovered)
        .count();

    let status = if records.is_empty() {
        DashboardStatus::NoData
    } else if recovered > 0 || report.degraded {
        DashboardStatus::Partial
    } else {
        DashboardStatus::Ready
    };

    tracing::debug!(
        "Dashboard built from {} submission(s): overall {}%, {} suggestion(s), {} recovered",
        records.len(),
        compliance.overall,
        report.suggestions.len(),
        recovered
    );

    DashboardSnapshot {
        status,
        total_submissions: records.len(),
        compliance,
        suggestions: report.suggestions,
        skipped_records: report.skipped,
        alerts: activity::alerts(&records),
        recent_entries: activity::recent_entries(&records, tz),
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Role;
    use rules::Priority;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn row(role: &str, data: Value) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            full_name: "Lee".to_string(),
            email: "lee@example.org".to_string(),
            role: role.to_string(),
            submitted_at: Utc::now(),
            submission_data: data,
        }
    }

    fn build(rows: &[Submission]) -> DashboardSnapshot {
        build_dashboard(rows, RuleSet::builtin(), 8, &ReportTimezone::default())
    }

    #[test]
    fn test_empty_dashboard() {
        let snapshot = build(&[]);
        assert_eq!(snapshot.status, DashboardStatus::NoData);
        assert_eq!(snapshot.compliance, ComplianceSummary::zero());
        assert_eq!(snapshot.suggestions.len(), 1);
        assert_eq!(snapshot.suggestions[0].priority, Priority::Low);
        assert!(snapshot.alerts.is_empty());
        assert!(snapshot.recent_entries.is_empty());
    }

    #[test]
    fn test_ready_dashboard() {
        let snapshot = build(&[row(
            "Manager",
            json!({
                "nursery_name": "Oak House",
                "total_questions": 10,
                "answered_questions": 5,
                "responses": {"first_aid_certified": "no"}
            }),
        )]);
        assert_eq!(snapshot.status, DashboardStatus::Ready);
        assert_eq!(snapshot.total_submissions, 1);
        assert_eq!(snapshot.compliance.overall, 50);
        assert_eq!(snapshot.compliance.for_role(Role::Manager), 50);
        assert_eq!(snapshot.alerts[0].message, "First aid certification missing - Lee");
        assert_eq!(snapshot.recent_entries[0].location, "Oak House");
    }

    #[test]
    fn test_recovered_rows_mark_partial() {
        let snapshot = build(&[
            row("Room Leader", json!("{broken")),
            row("Room Leader", json!({"total_questions": 4, "answered_questions": 4})),
        ]);
        assert_eq!(snapshot.status, DashboardStatus::Partial);
        assert_eq!(snapshot.skipped_records, 1);
        assert_eq!(snapshot.compliance.for_role(Role::RoomLeader), 100);
    }

    #[test]
    fn test_snapshot_serializes_roles_by_name() {
        let snapshot = build(&[]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["compliance"]["per_role"]["Deputy Manager"], 0);
    }
}
