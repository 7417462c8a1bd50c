use crate::domain::records::{
    self, Enrollment, NewEnrollment, NewStaffRatio, RoomPlanView, StaffRatio, WeeklyTotals,
    WEEKDAYS,
};
use crate::state::SharedState;
use crate::web::{ApiError, ApiJson};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct RoomPlanner {
    pub weekdays: [&'static str; 5],
    pub rooms: Vec<RoomPlanView>,
    pub totals: WeeklyTotals,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/ratios", get(list_ratios).post(create_ratio))
        .route("/enrollment", get(list_enrollment).post(create_enrollment))
        .route("/room-planner", get(room_planner))
        .with_state(state)
}

async fn list_ratios(State(state): State<SharedState>) -> Result<Json<Vec<StaffRatio>>, ApiError> {
    Ok(Json(state.store.fetch_staff_ratios().await?))
}

async fn create_ratio(
    State(state): State<SharedState>,
    ApiJson(ratio): ApiJson<NewStaffRatio>,
) -> Result<(StatusCode, Json<StaffRatio>), ApiError> {
    let assessment = ratio.assess()?;
    let row = state.store.insert_staff_ratio(&ratio, &assessment).await?;
    tracing::info!(
        "Recorded ratio {} for {} / {} ({})",
        row.actual_ratio,
        row.branch,
        row.room,
        row.status
    );
    Ok((StatusCode::CREATED, Json(row)))
}

async fn list_enrollment(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    Ok(Json(state.store.fetch_enrollment().await?))
}

async fn create_enrollment(
    State(state): State<SharedState>,
    ApiJson(entry): ApiJson<NewEnrollment>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let occupancy = entry.occupancy_rate()?;
    let row = state.store.insert_enrollment(&entry, occupancy).await?;
    tracing::info!("Recorded attendance for {} on {}: {}%", row.site, row.date, occupancy);
    Ok((StatusCode::CREATED, Json(row)))
}

async fn room_planner(State(state): State<SharedState>) -> Result<Json<RoomPlanner>, ApiError> {
    let plans = state.store.fetch_room_plans().await?;
    let totals = records::weekly_totals(&plans);
    let rooms = plans
        .into_iter()
        .map(|plan| RoomPlanView {
            staff_required: plan.staff_required().ok(),
            plan,
        })
        .collect();
    Ok(Json(RoomPlanner {
        weekdays: WEEKDAYS,
        rooms,
        totals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::memory::MemoryStore;
    use crate::domain::records::RoomPlan;
    use crate::web::test_support::{body_json, get, post_json, state};
    use chrono::Utc;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_ratio_create_and_list() {
        let app = router(state(MemoryStore::default()));
        let response = app
            .clone()
            .oneshot(post_json(
                "/ratios",
                json!({
                    "branch": "A",
                    "room": "102",
                    "age_group": "3-4 yrs",
                    "staff_count": 1,
                    "children_count": 12,
                    "required_ratio": "1:6"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["actual_ratio"], "1:12");
        assert_eq!(created["status"], "non-compliant");

        let listed = body_json(app.oneshot(get("/ratios")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_ratio_is_422() {
        let app = router(state(MemoryStore::default()));
        let response = app
            .oneshot(post_json(
                "/ratios",
                json!({
                    "branch": "A",
                    "room": "101",
                    "age_group": "1-2 yrs",
                    "staff_count": 2,
                    "children_count": 6,
                    "required_ratio": "3 to 1"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_enrollment_occupancy() {
        let app = router(state(MemoryStore::default()));
        let response = app
            .oneshot(post_json(
                "/enrollment",
                json!({
                    "site": "Site B",
                    "date": "2024-01-15",
                    "staff_count": 8,
                    "children_enrolled": 45,
                    "children_present": 42
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["occupancy_rate"], 93.3);
        assert_eq!(body["staff_attendance_rate"], 100.0);
        assert_eq!(body["planned_capacity"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_room_planner_totals() {
        let store = MemoryStore::default();
        let now = Utc::now();
        store.push_plan(RoomPlan {
            id: Uuid::new_v4(),
            site: "Perkins".to_string(),
            room_name: "Toddler Room".to_string(),
            age_group: "2-3 yrs".to_string(),
            ratio: "1:4".to_string(),
            monday_children: 7,
            tuesday_children: 8,
            wednesday_children: 6,
            thursday_children: 7,
            friday_children: 6,
            monday_staff: 2,
            tuesday_staff: 2,
            wednesday_staff: 2,
            thursday_staff: 2,
            friday_staff: 2,
            created_at: now,
            updated_at: now,
        });
        let app = router(state(store));
        let body = body_json(app.oneshot(get("/room-planner")).await.unwrap()).await;

        assert_eq!(body["weekdays"][0], "Mon");
        assert_eq!(body["rooms"][0]["room_name"], "Toddler Room");
        assert_eq!(body["rooms"][0]["staff_required"], json!([1.8, 2.0, 1.5, 1.8, 1.5]));
        assert_eq!(body["totals"]["total_children"], json!([7, 8, 6, 7, 6]));
        assert_eq!(body["totals"]["staff_required"], json!([2, 2, 2, 2, 2]));
    }
}
