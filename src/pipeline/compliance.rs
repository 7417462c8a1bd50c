use crate::domain::models::Role;
use crate::pipeline::normalize::{NormalizedSubmission, SubmissionData};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSummary {
    pub overall: u32,
    pub per_role: BTreeMap<Role, u32>,
}

impl ComplianceSummary {
    pub fn zero() -> Self {
        Self {
            overall: 0,
            per_role: Role::ALL.into_iter().map(|role| (role, 0)).collect(),
        }
    }

    pub fn for_role(&self, role: Role) -> u32 {
        self.per_role.get(&role).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    answered: u64,
    total: u64,
}

impl Tally {
    fn add(&mut self, data: &SubmissionData) {
        self.answered += u64::from(data.answered_questions);
        self.total += u64::from(data.total_questions);
    }

    fn percent(&self) -> u32 {
        percent(self.answered, self.total)
    }
}

/// `round(100 * answered / total)` with halves rounded up, 0 for an empty
/// total. Integer arithmetic only, so 12.5 always rounds to 13.
pub fn percent(answered: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let answered = u128::from(answered);
    let total = u128::from(total);
    let rounded = (answered * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

pub fn submission_rate(data: &SubmissionData) -> u32 {
    percent(
        u64::from(data.answered_questions),
        u64::from(data.total_questions),
    )
}

/// Groups by the stored role string. Rows with a role outside the canonical
/// set count toward `overall` only.
pub fn summarize(submissions: &[NormalizedSubmission]) -> ComplianceSummary {
    let mut overall = Tally::default();
    let mut groups: HashMap<&str, Tally> = HashMap::new();

    for submission in submissions {
        overall.add(&submission.data);
        groups
            .entry(submission.role.as_str())
            .or_default()
            .add(&submission.data);
    }

    let unrecognized = groups
        .keys()
        .filter(|role| Role::from_stored(role).is_none())
        .count();
    if unrecognized > 0 {
        tracing::debug!("{} submission role group(s) outside the canonical set", unrecognized);
    }

    ComplianceSummary {
        overall: overall.percent(),
        per_role: Role::ALL
            .into_iter()
            .map(|role| {
                let value = groups.get(role.as_str()).map(Tally::percent).unwrap_or(0);
                (role, value)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::PayloadStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(role: &str, total: u32, answered: u32) -> NormalizedSubmission {
        NormalizedSubmission {
            id: Uuid::new_v4(),
            full_name: "Staff".to_string(),
            email: "staff@example.org".to_string(),
            role: role.to_string(),
            submitted_at: Utc::now(),
            data: SubmissionData {
                nursery_name: None,
                total_questions: total,
                answered_questions: answered,
                responses: BTreeMap::new(),
            },
            status: PayloadStatus::Parsed,
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_single_manager_half_answered() {
        let summary = summarize(&[record("Manager", 10, 5)]);
        assert_eq!(summary.overall, 50);
        assert_eq!(summary.for_role(Role::Manager), 50);
        assert_eq!(summary.for_role(Role::RoomLeader), 0);
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        assert_eq!(summarize(&[]), ComplianceSummary::zero());
    }

    #[test]
    fn test_zero_total_is_zero_percent() {
        let summary = summarize(&[record("Room Leader", 0, 0), record("Room Leader", 0, 3)]);
        assert_eq!(summary.overall, 0);
        assert_eq!(summary.for_role(Role::RoomLeader), 0);
    }

    #[test]
    fn test_groups_pool_their_counts() {
        let summary = summarize(&[
            record("Deputy Manager", 12, 12),
            record("Deputy Manager", 12, 0),
            record("Area Manager", 36, 27),
        ]);
        assert_eq!(summary.for_role(Role::DeputyManager), 50);
        assert_eq!(summary.for_role(Role::AreaManager), 75);
        // 39 / 60
        assert_eq!(summary.overall, 65);
    }

    #[test]
    fn test_unrecognized_roles_only_count_overall() {
        let summary = summarize(&[record("manager", 10, 10), record("Manager", 10, 0)]);
        assert_eq!(summary.for_role(Role::Manager), 0);
        assert_eq!(summary.overall, 50);
        assert_eq!(summary.per_role.len(), 4);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(0, 7), 0);
        assert_eq!(percent(7, 7), 100);
    }

    #[test]
    fn test_answered_above_total_does_not_panic() {
        assert_eq!(percent(15, 10), 150);
        assert_eq!(percent(u64::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_overall_matches_formula_and_range() {
        let cases: &[&[(u32, u32)]] = &[
            &[(10, 3), (7, 7), (0, 0)],
            &[(36, 35), (12, 1)],
            &[(1, 0), (1, 1), (1, 0)],
        ];
        for case in cases {
            let records: Vec<_> = case.iter().map(|(t, a)| record("Manager", *t, *a)).collect();
            let total: u32 = case.iter().map(|(t, _)| t).sum();
            let answered: u32 = case.iter().map(|(_, a)| a).sum();
            let expected = (100.0 * f64::from(answered) / f64::from(total)).round() as u32;
            let summary = summarize(&records);
            assert_eq!(summary.overall, expected);
            assert!(summary.overall <= 100);
        }
    }
}
