use axum::{extract::State, http::StatusCode, Json};
use shared::AppError;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::user_service::{AuthResponse, CurrentUser, LoginRequest, RegisterRequest};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.user_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.user_service.login(req).await?))
}

pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<CurrentUser>> {
    let current = state.user_service.current_user(user).await?;
    Ok(Json(current))
}

/// Fallback for unknown routes, keeps the JSON error shape
pub async fn not_found() -> crate::error::ApiError {
    AppError::not_found("route").into()
}
