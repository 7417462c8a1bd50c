use crate::domain::form::{DetailField, FormEvent, FormState};
use crate::domain::models::Role;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::pipeline::normalize::{self, NormalizedSubmission};
use crate::state::SharedState;
use crate::web::{ApiError, ApiJson};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub nursery_name: String,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

impl SubmissionRequest {
    fn into_events(self) -> Vec<FormEvent> {
        let details = [
            (DetailField::FullName, self.full_name),
            (DetailField::Email, self.email),
            (DetailField::NurseryName, self.nursery_name),
        ]
        .into_iter()
        .map(|(field, value)| FormEvent::DetailsChanged { field, value });

        let answers = self
            .answers
            .into_iter()
            .map(|(question_id, value)| FormEvent::Answered { question_id, value });

        details.chain(answers).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionCreated {
    pub id: Uuid,
    pub total_questions: u32,
    pub answered_questions: u32,
}

pub fn router(state: SharedState) -> Router {
    let limiter = state.submission_limiter.clone();
    Router::new()
        .route(
            "/",
            get(list_submissions).merge(
                post(create_submission)
                    .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
            ),
        )
        .with_state(state)
}

async fn create_submission(
    State(state): State<SharedState>,
    ApiJson(request): ApiJson<SubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionCreated>), ApiError> {
    let role = request.role;
    let form = FormState::replay(role, request.into_events())?;
    let total_questions = form.total_questions();
    let answered_questions = form.answered_questions();
    let submission = form.into_submission()?;

    let id = state.store.insert_submission(&submission).await?;
    tracing::info!(
        "Stored {} submission {} ({}/{} answered)",
        role,
        id,
        answered_questions,
        total_questions
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreated {
            id,
            total_questions,
            answered_questions,
        }),
    ))
}

async fn list_submissions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<NormalizedSubmission>>, ApiError> {
    let rows = state.store.fetch_submissions().await?;
    Ok(Json(normalize::normalize_all(&rows)))
}
