use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::wallet_service::{TransactionPage, WalletSummary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn summary(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<WalletSummary>> {
    Ok(Json(state.wallet_service.summary(user.id).await?))
}

pub async fn transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<TransactionPage>> {
    let page = state
        .wallet_service
        .transactions(user.id, page.limit, page.offset)
        .await?;
    Ok(Json(page))
}
