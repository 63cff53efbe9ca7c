//! Franchises: admin management and the owner's aggregated view.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use shared::entity::{franchises, users};
use shared::{AppError, AppResult, Role};
use tracing::info;

use super::required_text;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::wallet_repository::WalletRepository;

#[derive(Debug, Deserialize)]
pub struct FranchiseRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub commission_percent: Decimal,
    #[serde(default)]
    pub owner_user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFranchiseRequest {
    pub name: Option<String>,
    pub commission_percent: Option<Decimal>,
    pub is_active: Option<bool>,
    pub owner_user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FranchiseView {
    #[serde(flatten)]
    pub franchise: franchises::Model,
    pub user_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FranchiseDashboard {
    pub franchise: franchises::Model,
    pub user_count: u64,
    pub active_users: u64,
    pub total_wallet_balance: Decimal,
    pub revenue: Decimal,
    pub commission_earned: Decimal,
}

/// Upper-case code of 2 to 32 letters, digits, `-` or `_`
pub fn normalize_code(code: &str) -> AppResult<String> {
    let code = code.trim().to_uppercase();
    let valid_chars = code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !(2..=32).contains(&code.len()) || !valid_chars {
        return Err(AppError::validation(
            "franchise code must be 2-32 letters, digits, '-' or '_'",
        ));
    }
    Ok(code)
}

fn validate_commission(percent: Decimal) -> AppResult<Decimal> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(AppError::validation("commission_percent must be between 0 and 100"));
    }
    Ok(percent.round_dp(2))
}

pub fn commission(revenue: Decimal, percent: Decimal) -> Decimal {
    (revenue * percent / Decimal::ONE_HUNDRED).round_dp(2)
}

pub struct FranchiseService {
    db: Arc<DatabaseConnection>,
}

impl FranchiseService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<FranchiseView>> {
        let franchises = franchises::Entity::find()
            .order_by_asc(franchises::Column::Name)
            .all(self.db.as_ref())
            .await?;

        let counts: HashMap<i64, i64> = users::Entity::find()
            .select_only()
            .column(users::Column::FranchiseId)
            .column_as(users::Column::Id.count(), "users")
            .filter(users::Column::FranchiseId.is_not_null())
            .group_by(users::Column::FranchiseId)
            .into_tuple::<(i64, i64)>()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .collect();

        Ok(franchises
            .into_iter()
            .map(|franchise| FranchiseView {
                user_count: counts.get(&franchise.id).copied().unwrap_or(0),
                franchise,
            })
            .collect())
    }

    pub async fn create(&self, req: FranchiseRequest) -> AppResult<franchises::Model> {
        let name = required_text("name", &req.name, 100)?;
        let code = normalize_code(&req.code)?;
        let commission_percent = validate_commission(req.commission_percent)?;

        let taken = franchises::Entity::find()
            .filter(franchises::Column::Code.eq(code.as_str()))
            .count(self.db.as_ref())
            .await?;
        if taken > 0 {
            return Err(AppError::conflict(format!("franchise code '{}' is already used", code)));
        }
        if let Some(owner_id) = req.owner_user_id {
            self.ensure_user(owner_id).await?;
        }

        let now = Utc::now();
        let franchise = franchises::ActiveModel {
            name: Set(name),
            code: Set(code),
            owner_user_id: Set(req.owner_user_id),
            commission_percent: Set(commission_percent),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        if let Some(owner_id) = franchise.owner_user_id {
            self.attach_owner(owner_id, franchise.id).await?;
        }
        info!("🏢 Franchise {} ({}) created", franchise.id, franchise.code);
        Ok(franchise)
    }

    pub async fn update(&self, id: i64, req: UpdateFranchiseRequest) -> AppResult<franchises::Model> {
        let franchise = self.find(id).await?;
        let mut active: franchises::ActiveModel = franchise.into();
        if let Some(name) = req.name.as_deref() {
            active.name = Set(required_text("name", name, 100)?);
        }
        if let Some(percent) = req.commission_percent {
            active.commission_percent = Set(validate_commission(percent)?);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(owner_id) = req.owner_user_id {
            self.ensure_user(owner_id).await?;
            active.owner_user_id = Set(Some(owner_id));
        }
        active.updated_at = Set(Utc::now());
        let franchise = active.update(self.db.as_ref()).await?;

        if let (Some(owner_id), Some(_)) = (franchise.owner_user_id, req.owner_user_id) {
            self.attach_owner(owner_id, franchise.id).await?;
        }
        info!("Franchise {} updated", franchise.id);
        Ok(franchise)
    }

    pub async fn users(&self, franchise_id: i64) -> AppResult<Vec<users::Model>> {
        self.find(franchise_id).await?;
        UserRepository::list_by_franchise(self.db.as_ref(), franchise_id).await
    }

    /// Franchise the caller may look at: their own, or any for admins
    pub async fn resolve_for(&self, actor: &users::Model, requested: Option<i64>) -> AppResult<franchises::Model> {
        if actor.role == Role::Admin.as_str() {
            let id = requested.ok_or_else(|| AppError::validation("franchise_id is required"))?;
            return self.find(id).await;
        }
        let id = actor.franchise_id.ok_or_else(|| AppError::not_found("franchise"))?;
        self.find(id).await
    }

    /// Members of the franchise, excluding its staff accounts
    pub async fn members(&self, franchise_id: i64) -> AppResult<Vec<users::Model>> {
        let members = UserRepository::list_by_franchise(self.db.as_ref(), franchise_id)
            .await?
            .into_iter()
            .filter(|u| u.role == Role::User.as_str())
            .collect();
        Ok(members)
    }

    pub async fn dashboard(&self, franchise: franchises::Model) -> AppResult<FranchiseDashboard> {
        let members = self.members(franchise.id).await?;
        let ids: Vec<i64> = members.iter().map(|u| u.id).collect();
        let total_wallet_balance = WalletRepository::total_balance(self.db.as_ref(), Some(&ids)).await?;
        let revenue = WalletRepository::total_debits(self.db.as_ref(), Some(&ids)).await?;

        Ok(FranchiseDashboard {
            user_count: members.len() as u64,
            active_users: members.iter().filter(|u| u.is_active).count() as u64,
            total_wallet_balance,
            commission_earned: commission(revenue, franchise.commission_percent),
            revenue,
            franchise,
        })
    }

    async fn find(&self, id: i64) -> AppResult<franchises::Model> {
        franchises::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("franchise"))
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<users::Model> {
        UserRepository::find_by_id(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| AppError::validation(format!("user {} does not exist", user_id)))
    }

    /// Owners manage the franchise they belong to
    async fn attach_owner(&self, owner_id: i64, franchise_id: i64) -> AppResult<()> {
        let owner = self.ensure_user(owner_id).await?;
        let promote = owner.role == Role::User.as_str();
        let mut active: users::ActiveModel = owner.into();
        active.franchise_id = Set(Some(franchise_id));
        if promote {
            active.role = Set(Role::Franchise.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());
        UserRepository::update(self.db.as_ref(), active).await?;
        Ok(())
    }
}
