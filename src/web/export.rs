use crate::pipeline::export::{self, CsvTable, Dataset};
use crate::pipeline::normalize;
use crate::state::SharedState;
use crate::web::ApiError;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:dataset", get(download))
        .with_state(state)
}

async fn load_table(state: &SharedState, dataset: Dataset) -> Result<CsvTable, ApiError> {
    let table = match dataset {
        Dataset::FormSubmissions => {
            let rows = state.store.fetch_submissions().await?;
            export::submissions_table(&normalize::normalize_all(&rows))
        }
        Dataset::StaffChildRatios => export::ratios_table(&state.store.fetch_staff_ratios().await?),
        Dataset::EnrollmentAttendance => {
            export::enrollment_table(&state.store.fetch_enrollment().await?)
        }
        Dataset::RoomPlanner => export::room_planner_table(&state.store.fetch_room_plans().await?),
    };
    Ok(table)
}

async fn download(
    State(state): State<SharedState>,
    Path(dataset): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let dataset = Dataset::try_from(dataset.as_str())
        .map_err(|_| ApiError::not_found(format!("unknown dataset `{dataset}`")))?;

    let table = load_table(&state, dataset).await?;
    let today = state.timezone.local_date(Utc::now());
    let csv = export::build_export(dataset, &table, today)
        .ok_or_else(|| ApiError::not_found(format!("no {dataset} data to download")))?;

    tracing::info!("Exported {} row(s) as {}", table.rows.len(), csv.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv.filename),
            ),
        ],
        csv.content,
    ))
}
