use axum::{extract::State, http::StatusCode, Json};

use crate::auth::{
    AuthResponse, AuthUser, ChangePasswordRequest, LoginRequest, RegisterRequest, UserProfile,
};
use crate::errors::ServiceError;
use crate::handlers::common::{created, validate_input, JsonBody};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    validate_input(&request)?;
    let response = state.services.auth.register(request).await?;
    Ok(created(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<AuthResponse> {
    validate_input(&request)?;
    let response = state.services.auth.login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = []))
)]
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.services.auth.profile(user.user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password is incorrect", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> ApiResult<()> {
    validate_input(&request)?;
    state
        .services
        .auth
        .change_password(user.user_id, request)
        .await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}
