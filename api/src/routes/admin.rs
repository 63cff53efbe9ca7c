use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::entity::{charges, franchises, users, wallet_transactions};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::services::admin_service::{AdminDashboard, ChargeRequest, RoleRequest, TransferRequest};
use crate::services::franchise_service::{FranchiseRequest, FranchiseView, UpdateFranchiseRequest};
use crate::services::plan_service::{PlanRequest, PlanView, UpdatePlanRequest};
use crate::services::strategy_service::{StrategyRequest, StrategyView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    pub is_active: bool,
}

pub async fn dashboard(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> ApiResult<Json<AdminDashboard>> {
    Ok(Json(state.admin_service.dashboard().await?))
}

pub async fn users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<users::Model>>> {
    let users = state
        .admin_service
        .users(query.role.as_deref(), query.search.as_deref())
        .await?;
    Ok(Json(users))
}

pub async fn set_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UserStatusRequest>,
) -> ApiResult<Json<users::Model>> {
    Ok(Json(state.admin_service.set_user_status(&admin, id, req.is_active).await?))
}

pub async fn set_user_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<Json<users::Model>> {
    Ok(Json(state.admin_service.set_user_role(&admin, id, req).await?))
}

pub async fn transfer(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<TransferRequest>,
) -> ApiResult<(StatusCode, Json<wallet_transactions::Model>)> {
    let entry = state.admin_service.transfer(&admin, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn charges(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> ApiResult<Json<Vec<charges::Model>>> {
    Ok(Json(state.admin_service.charges().await?))
}

pub async fn upsert_charge(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(charge_type): Path<String>,
    Json(req): Json<ChargeRequest>,
) -> ApiResult<Json<charges::Model>> {
    Ok(Json(state.admin_service.upsert_charge(&charge_type, req).await?))
}

pub async fn strategies(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> ApiResult<Json<Vec<StrategyView>>> {
    Ok(Json(state.strategy_service.list_all().await?))
}

pub async fn create_strategy(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<StrategyRequest>,
) -> ApiResult<(StatusCode, Json<StrategyView>)> {
    let strategy = state.strategy_service.create(admin.id, req, true).await?;
    Ok((StatusCode::CREATED, Json(strategy)))
}

pub async fn create_plan(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<PlanRequest>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    let plan = state.plan_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn update_plan(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePlanRequest>,
) -> ApiResult<Json<PlanView>> {
    Ok(Json(state.plan_service.update(id, req).await?))
}

pub async fn franchises(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> ApiResult<Json<Vec<FranchiseView>>> {
    Ok(Json(state.franchise_service.list().await?))
}

pub async fn create_franchise(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<FranchiseRequest>,
) -> ApiResult<(StatusCode, Json<franchises::Model>)> {
    let franchise = state.franchise_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(franchise)))
}

pub async fn update_franchise(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFranchiseRequest>,
) -> ApiResult<Json<franchises::Model>> {
    Ok(Json(state.franchise_service.update(id, req).await?))
}

pub async fn franchise_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<users::Model>>> {
    Ok(Json(state.franchise_service.users(id).await?))
}
