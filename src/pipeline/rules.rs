//! Declarative suggestion rules.
//!
//! A rule fires once per response key matched by its `trigger`, provided every
//! `require` check matches some key and no `unless` check matches any key.
//! Templates may use `{site}`, `{room}`, `{value}` and `{field}`.
use crate::pipeline::formatting::title_case;
use crate::pipeline::normalize::NormalizedSubmission;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const UNKNOWN_SITE: &str = "Unknown Branch";

const PLACEHOLDERS: [&str; 4] = ["site", "room", "value", "field"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub priority: Priority,
    pub category: String,
    pub kind: SuggestionKind,
    pub message: String,
    /// One-line plain text form used for text exports.
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatch {
    Exact(String),
    Contains(String),
}

impl FieldMatch {
    fn fragment(&self) -> &str {
        match self {
            FieldMatch::Exact(key) | FieldMatch::Contains(key) => key,
        }
    }

    fn matches(&self, key: &str) -> bool {
        match self {
            FieldMatch::Exact(expected) => key == expected,
            FieldMatch::Contains(fragment) => key.contains(fragment.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals(String),
    NonBlank,
}

impl Condition {
    fn holds(&self, value: &str) -> bool {
        match self {
            Condition::Equals(expected) => value == expected,
            Condition::NonBlank => !value.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub field: FieldMatch,
    pub condition: Condition,
}

impl Check {
    fn matching<'a>(
        &'a self,
        record: &'a NormalizedSubmission,
    ) -> Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a> {
        let responses = &record.data.responses;
        match &self.field {
            FieldMatch::Exact(key) => Box::new(
                responses
                    .get_key_value(key.as_str())
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .filter(|(_, v)| self.condition.holds(v))
                    .into_iter(),
            ),
            FieldMatch::Contains(_) => Box::new(
                responses
                    .iter()
                    .filter(|(k, v)| self.field.matches(k) && self.condition.holds(v))
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        }
    }

    fn any(&self, record: &NormalizedSubmission) -> bool {
        self.matching(record).next().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub trigger: Check,
    #[serde(default)]
    pub require: Vec<Check>,
    #[serde(default)]
    pub unless: Vec<Check>,
    pub priority: Priority,
    pub category: String,
    pub kind: SuggestionKind,
    pub message: String,
    pub summary: String,
}

impl Rule {
    pub fn evaluate(&self, record: &NormalizedSubmission) -> Vec<Suggestion> {
        if !self.require.iter().all(|check| check.any(record)) {
            return Vec::new();
        }
        if self.unless.iter().any(|check| check.any(record)) {
            return Vec::new();
        }

        let site = record.nursery_or(UNKNOWN_SITE);
        self.trigger
            .matching(record)
            .map(|(key, value)| {
                let lookup = |name: &str| -> Option<String> {
                    match name {
                        "site" => Some(site.to_string()),
                        "room" => Some(room_label(key, self.trigger.field.fragment())),
                        "value" => Some(value.trim().to_string()),
                        "field" => Some(title_case(key)),
                        _ => None,
                    }
                };
                Suggestion {
                    priority: self.priority,
                    category: self.category.clone(),
                    kind: self.kind,
                    message: render(&self.message, lookup),
                    summary: render(&self.summary, lookup),
                }
            })
            .collect()
    }

    fn checks(&self) -> impl Iterator<Item = &Check> {
        std::iter::once(&self.trigger)
            .chain(self.require.iter())
            .chain(self.unless.iter())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rule file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule set is empty")]
    Empty,
    #[error("rule `{rule}` has an empty field key")]
    EmptyField { rule: String },
    #[error("rule `{rule}` uses unknown placeholder `{{{placeholder}}}`")]
    UnknownPlaceholder { rule: String, placeholder: String },
    #[error("rule `{rule}` has an unclosed placeholder")]
    UnclosedPlaceholder { rule: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<RuleSet, RuleError> {
        let raw = std::fs::read_to_string(path)?;
        let rules: RuleSet = serde_json::from_str(&raw)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.rules.is_empty() {
            return Err(RuleError::Empty);
        }
        for rule in &self.rules {
            if rule.checks().any(|check| check.field.fragment().trim().is_empty()) {
                return Err(RuleError::EmptyField {
                    rule: rule.id.clone(),
                });
            }
            for template in [&rule.message, &rule.summary] {
                for placeholder in placeholders(template).map_err(|_| {
                    RuleError::UnclosedPlaceholder {
                        rule: rule.id.clone(),
                    }
                })? {
                    if !PLACEHOLDERS.contains(&placeholder) {
                        return Err(RuleError::UnknownPlaceholder {
                            rule: rule.id.clone(),
                            placeholder: placeholder.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, record: &NormalizedSubmission) -> Vec<Suggestion> {
        self.rules
            .iter()
            .flat_map(|rule| rule.evaluate(record))
            .collect()
    }
}

fn placeholders(template: &str) -> Result<Vec<&str>, ()> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or(())?;
        found.push(&after[..end]);
        rest = &after[end + 1..];
    }
    Ok(found)
}

/// Substitutes placeholders in a single pass, so substituted text is never
/// re-scanned. Unknown names are left as written.
fn render(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// First `room_<digits>` number in a response key.
pub fn room_number(key: &str) -> Option<&str> {
    key.match_indices("room_").find_map(|(idx, pattern)| {
        let rest = &key[idx + pattern.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// `room_3_ratio_status` -> `Room 3`; `curlew_baby_ratio_status` -> `Curlew Baby Room`.
fn room_label(key: &str, fragment: &str) -> String {
    if let Some(number) = room_number(key) {
        return format!("Room {number}");
    }
    let stem = key.replacen(fragment, "", 1);
    let label = title_case(stem.trim_matches('_').trim());
    if label.is_empty() {
        "a room".to_string()
    } else if label.to_lowercase().ends_with("room") {
        label
    } else {
        format!("{label} Room")
    }
}

fn check(field: FieldMatch, condition: Condition) -> Check {
    Check { field, condition }
}

fn exact(key: &str, value: &str) -> Check {
    check(
        FieldMatch::Exact(key.to_string()),
        Condition::Equals(value.to_string()),
    )
}

fn incorrect_ratio() -> Check {
    check(
        FieldMatch::Contains("ratio_status".to_string()),
        Condition::Equals("Incorrect Ratio".to_string()),
    )
}

struct Template<'a> {
    id: &'a str,
    priority: Priority,
    category: &'a str,
    kind: SuggestionKind,
    message: &'a str,
    summary: &'a str,
}

impl Template<'_> {
    fn rule(self, trigger: Check, require: Vec<Check>, unless: Vec<Check>) -> Rule {
        Rule {
            id: self.id.to_string(),
            trigger,
            require,
            unless,
            priority: self.priority,
            category: self.category.to_string(),
            kind: self.kind,
            message: self.message.to_string(),
            summary: self.summary.to_string(),
        }
    }
}

static BUILTIN: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    rules: vec![
        Template {
            id: "understaffed_room",
            priority: Priority::High,
            category: "staffing",
            kind: SuggestionKind::Warning,
            message: "{site}, {room} is understaffed. Hire 1 more staff member.",
            summary: "HIGH PRIORITY: {site}, {room} understaffed - hire 1 more staff",
        }
        .rule(incorrect_ratio(), vec![], vec![]),
        Template {
            id: "first_aid_missing",
            priority: Priority::High,
            category: "certification",
            kind: SuggestionKind::Warning,
            message: "First-aid certification is missing in {site}. Complete training immediately.",
            summary: "HIGH PRIORITY: {site} missing first-aid certification",
        }
        .rule(exact("first_aid_certified", "no"), vec![], vec![]),
        Template {
            id: "training_incomplete",
            priority: Priority::Medium,
            category: "training",
            kind: SuggestionKind::Warning,
            message: "Staff training incomplete in {site}. Schedule training sessions.",
            summary: "MEDIUM PRIORITY: {site} staff training incomplete",
        }
        .rule(exact("staff_training_complete", "no"), vec![], vec![]),
        Template {
            id: "safeguarding_concern",
            priority: Priority::High,
            category: "safeguarding",
            kind: SuggestionKind::Warning,
            message: "Safeguarding concern reported in {site}. Immediate attention required.",
            summary: "URGENT: {site} safeguarding concern reported",
        }
        .rule(exact("safeguarding_concerns", "yes"), vec![], vec![]),
        Template {
            id: "fire_safety_failed",
            priority: Priority::High,
            category: "safety",
            kind: SuggestionKind::Warning,
            message: "Fire safety check failed in {site}. Address immediately.",
            summary: "HIGH PRIORITY: {site} fire safety check failed",
        }
        .rule(exact("fire_safety_check", "no"), vec![], vec![]),
        Template {
            id: "staff_absences",
            priority: Priority::Medium,
            category: "staffing",
            kind: SuggestionKind::Info,
            message: "Staff absences reported in {site}: {value}. Consider temporary coverage.",
            summary: "MEDIUM PRIORITY: {site} staff absences - {value}",
        }
        .rule(
            check(FieldMatch::Exact("staff_absences".to_string()), Condition::NonBlank),
            vec![],
            vec![],
        ),
        Template {
            id: "attendance_rising",
            priority: Priority::Medium,
            category: "attendance",
            kind: SuggestionKind::Info,
            message: "Attendance rising in {site}. Consider additional part-time staff.",
            summary: "MEDIUM PRIORITY: {site} attendance rising - consider part-time staff",
        }
        .rule(exact("attendance_trend", "increasing"), vec![], vec![]),
        Template {
            id: "attendance_declining",
            priority: Priority::Medium,
            category: "attendance",
            kind: SuggestionKind::Warning,
            message: "Attendance declining in {site}. Investigate causes.",
            summary: "MEDIUM PRIORITY: {site} attendance declining",
        }
        .rule(exact("attendance_trend", "decreasing"), vec![], vec![]),
        Template {
            id: "fully_compliant",
            priority: Priority::Low,
            category: "compliance",
            kind: SuggestionKind::Success,
            message: "{site} is fully compliant and operating optimally.",
            summary: "SUCCESS: {site} fully compliant and optimal",
        }
        .rule(
            exact("fire_safety_check", "yes"),
            vec![
                exact("first_aid_certified", "yes"),
                exact("staff_training_complete", "yes"),
                exact("safeguarding_concerns", "no"),
            ],
            vec![incorrect_ratio()],
        ),
    ],
});
