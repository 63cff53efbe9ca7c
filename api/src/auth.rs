//! Bearer-token extractors for handlers.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use shared::entity::users;
use shared::{AppError, Role};

use crate::error::ApiError;
use crate::state::AppState;

/// Any signed-in, active user
pub struct AuthUser(pub users::Model);

/// Signed-in user with the admin role
pub struct AdminUser(pub users::Model);

/// Franchise owner, or an admin acting on a franchise
pub struct FranchiseUser(pub users::Model);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("malformed authorization header"))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin.as_str() {
            return Err(AppError::forbidden("admin access required").into());
        }
        Ok(AdminUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for FranchiseUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Franchise.as_str() && user.role != Role::Admin.as_str() {
            return Err(AppError::forbidden("franchise access required").into());
        }
        Ok(FranchiseUser(user))
    }
}
