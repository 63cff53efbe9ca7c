use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::api_key_service::{ApiKeyView, CreateApiKeyRequest, UpdateApiKeyRequest};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<ApiKeyView>>> {
    Ok(Json(state.api_key_service.list(user.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateApiKeyRequest>,
) -> ApiResult<(StatusCode, Json<ApiKeyView>)> {
    let key = state.api_key_service.create(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(key)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateApiKeyRequest>,
) -> ApiResult<Json<ApiKeyView>> {
    Ok(Json(state.api_key_service.update(user.id, id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.api_key_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
