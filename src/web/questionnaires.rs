use crate::domain::models::Role;
use crate::domain::questions::{self, Section};
use crate::web::ApiError;
use axum::{extract::Path, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct Questionnaire {
    pub role: Role,
    pub slug: &'static str,
    pub total_questions: usize,
    pub sections: &'static [Section],
}

impl Questionnaire {
    fn for_role(role: Role) -> Self {
        Self {
            role,
            slug: role.slug(),
            total_questions: questions::questions(role).count(),
            sections: questions::questionnaire(role),
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_questionnaires))
        .route("/:role", get(get_questionnaire))
}

async fn list_questionnaires() -> Json<Vec<Questionnaire>> {
    Json(Role::ALL.into_iter().map(Questionnaire::for_role).collect())
}

async fn get_questionnaire(Path(role): Path<String>) -> Result<Json<Questionnaire>, ApiError> {
    let role = Role::try_from(role.as_str())
        .map_err(|_| ApiError::not_found(format!("unknown role `{role}`")))?;
    Ok(Json(Questionnaire::for_role(role)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{body_json, get};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_list_has_every_role() {
        let response = router().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let roles: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["Manager", "Deputy Manager", "Room Leader", "Area Manager"]);
    }

    #[tokio::test]
    async fn test_single_questionnaire() {
        let response = router().oneshot(get("/room-leader")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["slug"], "room-leader");
        assert_eq!(body["total_questions"], 10);
        assert_eq!(body["sections"][0]["questions"][0]["kind"]["type"], "yes_no");
    }

    #[tokio::test]
    async fn test_unknown_role_is_404() {
        let response = router().oneshot(get("/chef")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
