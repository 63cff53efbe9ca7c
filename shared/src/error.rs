//! Domain error shared by every service of the platform.

use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("insufficient wallet balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Errors caused by the caller, as opposed to the server
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AppError::Database(_) | AppError::Crypto(_) | AppError::Template(_) | AppError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_message() {
        let err = AppError::InsufficientBalance {
            required: dec!(100.00),
            available: dec!(25.50),
        };
        assert_eq!(
            err.to_string(),
            "insufficient wallet balance: required 100.00, available 25.50"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_database_error_is_server_side() {
        let err = AppError::from(DbErr::Custom("boom".to_string()));
        assert!(!err.is_client_error());
    }
}
