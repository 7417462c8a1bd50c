use crate::domain::models::{Role, Submission};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionData {
    pub nursery_name: Option<String>,
    pub total_questions: u32,
    pub answered_questions: u32,
    pub responses: BTreeMap<String, String>,
}

/// Whether the stored payload parsed cleanly or had to be replaced (wholly or
/// partly) with defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStatus {
    Parsed,
    Recovered,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSubmission {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: SubmissionData,
    pub status: PayloadStatus,
    /// Decoded payload object, `Null` when it could not be decoded.
    #[serde(skip)]
    pub payload: Value,
}

impl NormalizedSubmission {
    pub fn canonical_role(&self) -> Option<Role> {
        Role::from_stored(&self.role)
    }

    pub fn nursery_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.data.nursery_name.as_deref().unwrap_or(fallback)
    }

    pub fn response(&self, key: &str) -> Option<&str> {
        self.data.responses.get(key).map(String::as_str)
    }
}

pub fn normalize(submission: &Submission) -> NormalizedSubmission {
    let payload = decode_payload(&submission.submission_data);
    let (data, status) = match &payload {
        Some(object) => extract(object),
        None => (SubmissionData::default(), PayloadStatus::Recovered),
    };

    if status == PayloadStatus::Recovered {
        tracing::warn!(
            "Submission {} ({}) has a malformed payload, using defaults",
            submission.id,
            submission.role
        );
    }

    NormalizedSubmission {
        id: submission.id,
        full_name: submission.full_name.clone(),
        email: submission.email.clone(),
        role: submission.role.clone(),
        submitted_at: submission.submitted_at,
        data,
        status,
        payload: payload.map(Value::Object).unwrap_or(Value::Null),
    }
}

pub fn normalize_all(submissions: &[Submission]) -> Vec<NormalizedSubmission> {
    submissions.iter().map(normalize).collect()
}

/// Accepts an object or a JSON string holding one. Anything else yields `None`.
fn decode_payload(raw: &Value) -> Option<serde_json::Map<String, Value>> {
    match raw {
        Value::Object(object) => Some(object.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => Some(object),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Submission payload is not valid JSON: {}", e);
                None
            }
        },
        _ => None,
    }
}

fn extract(object: &serde_json::Map<String, Value>) -> (SubmissionData, PayloadStatus) {
    let mut status = PayloadStatus::Parsed;

    let nursery_name = object
        .get("nursery_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let responses = match object.get("responses") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, value)| answer_text(value).map(|text| (key.clone(), text)))
            .collect(),
        Some(_) => {
            status = PayloadStatus::Recovered;
            BTreeMap::new()
        }
    };

    let data = SubmissionData {
        nursery_name,
        total_questions: count(object.get("total_questions")),
        answered_questions: count(object.get("answered_questions")),
        responses,
    };
    (data, status)
}

fn count(value: Option<&Value>) -> u32 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
