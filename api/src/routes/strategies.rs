use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::strategy_service::{PreviewCodeRequest, StrategyRequest, StrategyView, UpdateStrategyRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<StrategyView>>> {
    Ok(Json(state.strategy_service.list(user.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<StrategyRequest>,
) -> ApiResult<(StatusCode, Json<StrategyView>)> {
    let strategy = state.strategy_service.create(user.id, req, false).await?;
    Ok((StatusCode::CREATED, Json(strategy)))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<StrategyView>> {
    Ok(Json(state.strategy_service.get(&user, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStrategyRequest>,
) -> ApiResult<Json<StrategyView>> {
    Ok(Json(state.strategy_service.update(user.id, id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.strategy_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<StrategyView>> {
    Ok(Json(state.strategy_service.start(user.id, id).await?))
}

pub async fn stop(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<StrategyView>> {
    Ok(Json(state.strategy_service.stop(user.id, id).await?))
}

pub async fn visibility(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<VisibilityRequest>,
) -> ApiResult<Json<StrategyView>> {
    Ok(Json(state.strategy_service.set_visibility(user.id, id, req.is_public).await?))
}

pub async fn code(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let code = state.strategy_service.code(&user, id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], code))
}

pub async fn preview_code(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(req): Json<PreviewCodeRequest>,
) -> ApiResult<impl IntoResponse> {
    let code = state.strategy_service.preview(req)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], code))
}
