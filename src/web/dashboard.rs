use crate::pipeline::{self, normalize, suggestions, DashboardSnapshot};
use crate::state::SharedState;
use crate::web::{ApiError, ApiQuery};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub const MAX_SUGGESTION_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub limit: Option<usize>,
}

impl DashboardQuery {
    fn limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, MAX_SUGGESTION_LIMIT)
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/suggestions.txt", get(suggestion_summary))
        .with_state(state)
}

async fn dashboard(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let rows = state.store.fetch_submissions().await?;
    let snapshot = pipeline::build_dashboard(
        &rows,
        &state.rules,
        query.limit(state.suggestion_limit),
        &state.timezone,
    );
    Ok(Json(snapshot))
}

/// Plain-text suggestion list, one summary line each.
async fn suggestion_summary(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.store.fetch_submissions().await?;
    let records = normalize::normalize_all(&rows);
    let report = suggestions::generate(&records, &state.rules, query.limit(state.suggestion_limit));
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        suggestions::summary_text(&report.suggestions),
    ))
}
