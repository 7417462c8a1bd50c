//! Questionnaire form state.
//!
//! `FormState` is an immutable value: every change goes through
//! [`FormState::apply`], which consumes the old state and returns the next one.
//! Counting, validation and the final submission payload are all derived from
//! the state, never tracked separately.
use crate::domain::models::{NewSubmission, Role};
use crate::domain::questions::{self, InvalidAnswer};
use crate::pipeline::compliance::percent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    FullName,
    Email,
    NurseryName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterDetails {
    pub full_name: String,
    pub email: String,
    pub nursery_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    DetailsChanged { field: DetailField, value: String },
    Answered { question_id: String, value: String },
    Cleared { question_id: String },
    Reset,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown question `{0}` for this role")]
    UnknownQuestion(String),
    #[error("invalid answer for `{question_id}`: {reason}")]
    InvalidAnswer {
        question_id: String,
        #[source]
        reason: InvalidAnswer,
    },
    #[error("missing required detail: {0}")]
    MissingDetail(&'static str),
    #[error("email address looks invalid")]
    InvalidEmail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    role: Role,
    details: SubmitterDetails,
    answers: BTreeMap<String, String>,
}

impl FormState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            details: SubmitterDetails::default(),
            answers: BTreeMap::new(),
        }
    }

    /// Folds a sequence of events over a fresh form, stopping at the first
    /// rejected event.
    pub fn replay<I>(role: Role, events: I) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = FormEvent>,
    {
        events
            .into_iter()
            .try_fold(Self::new(role), |state, event| state.apply(event))
    }

    pub fn apply(self, event: FormEvent) -> Result<Self, FormError> {
        let FormState {
            role,
            mut details,
            mut answers,
        } = self;

        match event {
            FormEvent::DetailsChanged { field, value } => match field {
                DetailField::FullName => details.full_name = value,
                DetailField::Email => details.email = value,
                DetailField::NurseryName => details.nursery_name = value,
            },
            FormEvent::Answered { question_id, value } => {
                let question = questions::find_question(role, &question_id)
                    .ok_or_else(|| FormError::UnknownQuestion(question_id.clone()))?;
                if value.trim().is_empty() {
                    answers.remove(&question_id);
                } else {
                    let canonical = question
                        .kind
                        .canonicalize(&value)
                        .map_err(|reason| FormError::InvalidAnswer {
                            question_id: question_id.clone(),
                            reason,
                        })?;
                    answers.insert(question_id, canonical);
                }
            }
            FormEvent::Cleared { question_id } => {
                answers.remove(&question_id);
            }
            FormEvent::Reset => return Ok(Self::new(role)),
        }

        Ok(Self {
            role,
            details,
            answers,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn details(&self) -> &SubmitterDetails {
        &self.details
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn total_questions(&self) -> u32 {
        questions::visible_questions(self.role, &self.answers).count() as u32
    }

    pub fn answered_questions(&self) -> u32 {
        self.visible_answers().count() as u32
    }

    pub fn progress_percent(&self) -> u32 {
        percent(
            u64::from(self.answered_questions()),
            u64::from(self.total_questions()),
        )
    }

    /// Sections whose visible, non-optional questions are all answered.
    pub fn completed_sections(&self) -> u32 {
        questions::questionnaire(self.role)
            .iter()
            .filter(|section| {
                section
                    .questions
                    .iter()
                    .filter(|q| !q.optional && questions::is_visible(q, &self.answers))
                    .all(|q| self.answers.contains_key(q.id))
            })
            .count() as u32
    }

    fn visible_answers(&self) -> impl Iterator<Item = (&'static str, &String)> + '_ {
        questions::visible_questions(self.role, &self.answers)
            .filter_map(|q| self.answers.get(q.id).map(|value| (q.id, value)))
    }

    /// Builds the insert payload. Answers to questions hidden by a condition
    /// are dropped.
    pub fn into_submission(self) -> Result<NewSubmission, FormError> {
        let full_name = self.details.full_name.trim();
        let email = self.details.email.trim();
        let nursery_name = self.details.nursery_name.trim();

        if full_name.is_empty() {
            return Err(FormError::MissingDetail("full_name"));
        }
        if email.is_empty() {
            return Err(FormError::MissingDetail("email"));
        }
        if nursery_name.is_empty() {
            return Err(FormError::MissingDetail("nursery_name"));
        }
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(FormError::InvalidEmail);
        }

        let responses: BTreeMap<&str, &String> = self.visible_answers().collect();

        Ok(NewSubmission {
            full_name: full_name.to_string(),
            email: email.to_string(),
            role: self.role,
            submission_data: json!({
                "nursery_name": nursery_name,
                "responses": responses,
                "total_questions": self.total_questions(),
                "answered_questions": self.answered_questions(),
                "completed_sections": self.completed_sections(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_id: &str, value: &str) -> FormEvent {
        FormEvent::Answered {
            question_id: question_id.to_string(),
            value: value.to_string(),
        }
    }

    fn detail(field: DetailField, value: &str) -> FormEvent {
        FormEvent::DetailsChanged {
            field,
            value: value.to_string(),
        }
    }

    fn filled_details() -> Vec<FormEvent> {
        vec![
            detail(DetailField::FullName, "Amira Khan"),
            detail(DetailField::Email, "amira@example.org"),
            detail(DetailField::NurseryName, "Oak House"),
        ]
    }

    #[test]
    fn test_apply_does_not_touch_previous_state() {
        let start = FormState::new(Role::RoomLeader);
        let snapshot = start.clone();
        let next = start.clone().apply(answer("ratios_maintained", "yes")).unwrap();

        assert_eq!(start, snapshot);
        assert_eq!(next.answered_questions(), 1);
        assert_eq!(start.answered_questions(), 0);
    }

    #[test]
    fn test_unknown_question_rejected() {
        let err = FormState::new(Role::Manager)
            .apply(answer("ratios_maintained", "yes"))
            .unwrap_err();
        assert_eq!(err, FormError::UnknownQuestion("ratios_maintained".to_string()));
    }

    #[test]
    fn test_invalid_yes_no_rejected() {
        let err = FormState::new(Role::Manager)
            .apply(answer("checks_logged", "sometimes"))
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidAnswer { .. }));
    }

    #[test]
    fn test_blank_answer_clears() {
        let state = FormState::replay(
            Role::Manager,
            vec![answer("staff_issues", "late bus"), answer("staff_issues", "   ")],
        )
        .unwrap();
        assert!(state.answers().is_empty());
    }

    #[test]
    fn test_hidden_follow_up_not_counted_or_submitted() {
        let mut events = filled_details();
        events.extend([
            answer("children_outside", "no"),
            answer("outside_reason", "Heavy rain"),
            answer("children_outside", "yes"),
        ]);
        let state = FormState::replay(Role::AreaManager, events).unwrap();

        assert_eq!(state.answered_questions(), 1);
        assert!(state.answered_questions() <= state.total_questions());

        let submission = state.into_submission().unwrap();
        let responses = submission.submission_data["responses"].as_object().unwrap();
        assert!(responses.contains_key("children_outside"));
        assert!(!responses.contains_key("outside_reason"));
    }

    #[test]
    fn test_into_submission_payload_shape() {
        let mut events = filled_details();
        events.extend([
            answer("ratios_maintained", "Yes"),
            answer("safeguarding_concerns", "no"),
        ]);
        let submission = FormState::replay(Role::RoomLeader, events)
            .unwrap()
            .into_submission()
            .unwrap();

        assert_eq!(submission.role, Role::RoomLeader);
        assert_eq!(submission.full_name, "Amira Khan");
        let data = &submission.submission_data;
        assert_eq!(data["nursery_name"], "Oak House");
        assert_eq!(data["total_questions"], 10);
        assert_eq!(data["answered_questions"], 2);
        assert_eq!(data["responses"]["ratios_maintained"], "yes");
    }

    #[test]
    fn test_missing_details_rejected() {
        let state = FormState::replay(
            Role::Manager,
            vec![detail(DetailField::FullName, "Sam"), detail(DetailField::Email, "sam@x.org")],
        )
        .unwrap();
        assert_eq!(
            state.into_submission().unwrap_err(),
            FormError::MissingDetail("nursery_name")
        );

        let state = FormState::replay(
            Role::Manager,
            vec![
                detail(DetailField::FullName, "Sam"),
                detail(DetailField::Email, "not-an-email"),
                detail(DetailField::NurseryName, "Elm"),
            ],
        )
        .unwrap();
        assert_eq!(state.into_submission().unwrap_err(), FormError::InvalidEmail);
    }

    #[test]
    fn test_reset_keeps_role() {
        let state = FormState::replay(
            Role::DeputyManager,
            vec![answer("room_checks", "yes"), FormEvent::Reset],
        )
        .unwrap();
        assert_eq!(state, FormState::new(Role::DeputyManager));
    }

    #[test]
    fn test_progress_and_sections() {
        let state = FormState::replay(
            Role::DeputyManager,
            vec![
                answer("room_checks", "yes"),
                answer("accident_forms", "no"),
                answer("routines_smooth", "yes"),
            ],
        )
        .unwrap();
        assert_eq!(state.total_questions(), 12);
        assert_eq!(state.progress_percent(), 25);
        assert_eq!(state.completed_sections(), 1);
    }
}
