pub mod dashboard;
pub mod export;
pub mod questionnaires;
pub mod records;
pub mod submissions;

use crate::db::store::StoreError;
use crate::domain::form::FormError;
use crate::domain::records::RecordError;
use crate::state::SharedState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/questionnaires", questionnaires::router())
        .nest("/submissions", submissions::router(state.clone()))
        .nest("/dashboard", dashboard::router(state.clone()))
        .nest("/records", records::router(state.clone()))
        .nest("/export", export::router(state))
}

/// JSON error body `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// `Json` body extractor whose rejections use the `ApiError` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejections use the `ApiError` body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store request failed: {}", e);
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Data store is unavailable. Please try again shortly.",
        )
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        tracing::debug!("Rejected form submission: {}", e);
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        tracing::debug!("Rejected record: {}", e);
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    }
}
