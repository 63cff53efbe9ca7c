use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::entity::strategy_subscriptions;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::marketplace_service::{MarketplaceEntry, SubscribeRequest, SubscriptionView};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, AuthUser(_user): AuthUser) -> ApiResult<Json<Vec<MarketplaceEntry>>> {
    Ok(Json(state.marketplace_service.list().await?))
}

/// The body is optional; `{}` or no body subscribes without an API key
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Option<Json<SubscribeRequest>>,
) -> ApiResult<(StatusCode, Json<strategy_subscriptions::Model>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let subscription = state.marketplace_service.subscribe(user.id, id, req).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<SubscriptionView>>> {
    Ok(Json(state.marketplace_service.list_subscriptions(user.id).await?))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<strategy_subscriptions::Model>> {
    Ok(Json(state.marketplace_service.cancel(user.id, id).await?))
}
