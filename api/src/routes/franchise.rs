use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::entity::users;

use crate::auth::FranchiseUser;
use crate::error::ApiResult;
use crate::services::franchise_service::FranchiseDashboard;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FranchiseQuery {
    pub franchise_id: Option<i64>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    FranchiseUser(user): FranchiseUser,
    Query(query): Query<FranchiseQuery>,
) -> ApiResult<Json<FranchiseDashboard>> {
    let franchise = state.franchise_service.resolve_for(&user, query.franchise_id).await?;
    Ok(Json(state.franchise_service.dashboard(franchise).await?))
}

pub async fn users(
    State(state): State<AppState>,
    FranchiseUser(user): FranchiseUser,
    Query(query): Query<FranchiseQuery>,
) -> ApiResult<Json<Vec<users::Model>>> {
    let franchise = state.franchise_service.resolve_for(&user, query.franchise_id).await?;
    Ok(Json(state.franchise_service.members(franchise.id).await?))
}
