//! HTTP error responses for the REST API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::AppError;
use tracing::error;

/// Wrapper turning the domain error into a JSON response
#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn status_from_error(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        AppError::Database(_) | AppError::Crypto(_) | AppError::Template(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_from_error(&self.0);
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            error!("Request failed: {:?}", self.0);
            "internal server error".to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_from_error(&AppError::not_found("strategy")), StatusCode::NOT_FOUND);
        assert_eq!(status_from_error(&AppError::conflict("running")), StatusCode::CONFLICT);
        assert_eq!(
            status_from_error(&AppError::InsufficientBalance { required: dec!(10), available: dec!(1) }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_from_error(&AppError::Database(DbErr::Custom("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = ApiError(AppError::Crypto("bad key".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
