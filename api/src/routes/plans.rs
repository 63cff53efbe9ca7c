use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::plan_service::{CurrentPlan, PlanView, PurchaseResponse};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanView>>> {
    Ok(Json(state.plan_service.list_active().await?))
}

pub async fn purchase(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<PurchaseResponse>)> {
    let purchase = state.plan_service.purchase(user.id, id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn current(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Option<CurrentPlan>>> {
    Ok(Json(state.plan_service.current(user.id).await?))
}
