use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::dashboard_service::UserDashboard;
use crate::state::AppState;

pub async fn user_dashboard(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<UserDashboard>> {
    Ok(Json(state.dashboard_service.for_user(user.id).await?))
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!("Database ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}
