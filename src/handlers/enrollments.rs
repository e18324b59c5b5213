use crate::{
    auth::AuthenticatedBuyer, entities::enrollment, entities::order_item::Plan,
    errors::ServiceError, ApiResponse, AppState,
};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub course_id: String,
    pub plan: Plan,
    pub course_name: String,
    pub order_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub access_granted: bool,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(model: enrollment::Model) -> Self {
        Self {
            course_id: model.course_id,
            plan: model.plan,
            course_name: model.course_name,
            order_id: model.order_id,
            enrolled_at: model.enrolled_at,
            access_granted: model.access_granted,
        }
    }
}

/// List the calling buyer's course enrollments
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    responses(
        (status = 200, description = "Buyer's enrollments", body = ApiResponse<Vec<EnrollmentResponse>>),
        (status = 401, description = "Unauthenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
) -> Result<Json<ApiResponse<Vec<EnrollmentResponse>>>, ServiceError> {
    let enrollments = state
        .services
        .enrollments
        .list_enrollments(&buyer.id)
        .await?;
    Ok(Json(ApiResponse::success(
        enrollments
            .into_iter()
            .map(EnrollmentResponse::from)
            .collect(),
    )))
}

/// Enrollment routes
pub fn enrollment_routes() -> Router<AppState> {
    Router::new().route("/", get(list_enrollments))
}
