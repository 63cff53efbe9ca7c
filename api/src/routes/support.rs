use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::entity::support_tickets;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::support_service::{CreateTicketRequest, ReplyRequest, ReplyView, TicketDetail};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<support_tickets::Model>)> {
    let ticket = state.support_service.create(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TicketQuery>,
) -> ApiResult<Json<Vec<support_tickets::Model>>> {
    Ok(Json(state.support_service.list(&user, query.status.as_deref()).await?))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.support_service.get(&user, id).await?))
}

pub async fn reply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ReplyRequest>,
) -> ApiResult<(StatusCode, Json<ReplyView>)> {
    let reply = state.support_service.reply(&user, id, req).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn set_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<support_tickets::Model>> {
    Ok(Json(state.support_service.set_status(&user, id, &req.status).await?))
}
