use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{franchises, users};
use shared::security::{hash_password, verify_password, TokenSigner};
use shared::{AppError, AppResult, Role};
use tracing::info;

use super::required_text;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::wallet_repository::WalletRepository;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub franchise_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: users::Model,
}

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: users::Model,
    pub wallet_balance: Decimal,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("a valid email address is required"))
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub struct UserService {
    db: Arc<DatabaseConnection>,
    tokens: TokenSigner,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, tokens: TokenSigner) -> Self {
        Self { db, tokens }
    }

    /// Create the account and its empty wallet together
    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        let name = required_text("name", &req.name, 100)?;
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_password(&req.password)?;
        let password_hash = hash_password(&req.password);

        let txn = self.db.begin().await?;

        if UserRepository::find_by_email(&txn, &email).await?.is_some() {
            return Err(AppError::conflict("email is already registered"));
        }

        let franchise_id = match req.franchise_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let franchise = franchises::Entity::find()
                    .filter(franchises::Column::Code.eq(code.to_uppercase()))
                    .filter(franchises::Column::IsActive.eq(true))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::validation(format!("unknown franchise code '{}'", code)))?;
                Some(franchise.id)
            }
            None => None,
        };

        let now = Utc::now();
        let user = UserRepository::create(
            &txn,
            users::ActiveModel {
                name: Set(name),
                email: Set(email),
                password_hash: Set(password_hash),
                role: Set(Role::User.as_str().to_string()),
                franchise_id: Set(franchise_id),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;
        WalletRepository::create_for_user(&txn, user.id).await?;

        txn.commit().await?;
        info!("✅ Registered user {} ({})", user.id, user.email);

        let token = self.tokens.issue(user.id, &user.role, Utc::now())?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        let user = UserRepository::find_by_email(self.db.as_ref(), &email)
            .await?
            .filter(|u| verify_password(&req.password, &u.password_hash))
            .ok_or_else(|| AppError::unauthorized("invalid email or password"))?;

        if !user.is_active {
            return Err(AppError::forbidden("account is disabled"));
        }

        let token = self.tokens.issue(user.id, &user.role, Utc::now())?;
        info!("User {} logged in", user.id);
        Ok(AuthResponse { token, user })
    }

    /// Resolve a bearer token to an active user
    pub async fn authenticate(&self, token: &str) -> AppResult<users::Model> {
        let claims = self.tokens.verify(token, Utc::now())?;
        let user = UserRepository::find_by_id(self.db.as_ref(), claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;
        if !user.is_active {
            return Err(AppError::forbidden("account is disabled"));
        }
        Ok(user)
    }

    pub async fn current_user(&self, user: users::Model) -> AppResult<CurrentUser> {
        let wallet_balance = WalletRepository::find_by_user(self.db.as_ref(), user.id)
            .await?
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO);
        Ok(CurrentUser { user, wallet_balance })
    }

    /// Make sure an admin account exists for the given credentials
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> AppResult<users::Model> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let txn = self.db.begin().await?;
        let admin = match UserRepository::find_by_email(&txn, &email).await? {
            Some(user) if user.role == Role::Admin.as_str() => user,
            Some(user) => {
                let mut active: users::ActiveModel = user.into();
                active.role = Set(Role::Admin.as_str().to_string());
                active.updated_at = Set(Utc::now());
                UserRepository::update(&txn, active).await?
            }
            None => {
                let now = Utc::now();
                let user = UserRepository::create(
                    &txn,
                    users::ActiveModel {
                        name: Set("Administrator".to_string()),
                        email: Set(email),
                        password_hash: Set(hash_password(password)),
                        role: Set(Role::Admin.as_str().to_string()),
                        franchise_id: Set(None),
                        is_active: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    },
                )
                .await?;
                WalletRepository::create_for_user(&txn, user.id).await?;
                info!("👤 Created admin account {}", user.email);
                user
            }
        };
        txn.commit().await?;
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Trader@Example.COM "), "trader@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("trader@example.com").is_ok());
        assert!(validate_email("trader.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("trader@localhost").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }
}
