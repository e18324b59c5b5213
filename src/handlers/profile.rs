use crate::{
    auth::AuthenticatedBuyer,
    errors::ServiceError,
    services::profiles::{ProfileResponse, UpdateProfileInput},
    ApiResponse, AppState,
};
use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use validator::Validate;

/// Fetch the calling buyer's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Buyer profile", body = ApiResponse<ProfileResponse>),
        (status = 404, description = "No profile yet", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
) -> Result<Json<ApiResponse<ProfileResponse>>, ServiceError> {
    let profile = state.services.profiles.get_profile(&buyer.id).await?;
    Ok(Json(ApiResponse::success(ProfileResponse::from(profile))))
}

/// Update the calling buyer's profile
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileInput,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ServiceError> {
    input.validate()?;
    let profile = state
        .services
        .profiles
        .update_profile(&buyer, input)
        .await?;
    Ok(Json(ApiResponse::success(ProfileResponse::from(profile))))
}

/// Profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile))
        .route("/", put(update_profile))
}
