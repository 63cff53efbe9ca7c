use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{api_keys, charges, franchises, strategies, strategy_subscriptions, support_tickets, users, wallet_transactions};
use shared::{AppError, AppResult, ChargeType, LedgerReason, Notifier, Role, SubscriptionStatus, TicketStatus};
use tracing::info;

use super::optional_text;
use super::wallet_service::WalletService;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::wallet_repository::WalletRepository;

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_users: u64,
    pub active_users: u64,
    pub total_strategies: u64,
    pub running_strategies: u64,
    pub public_strategies: u64,
    pub total_api_keys: u64,
    pub active_subscriptions: u64,
    pub open_tickets: u64,
    pub total_wallet_balance: Decimal,
    pub total_revenue: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub user_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
    #[serde(default)]
    pub franchise_id: Option<i64>,
}

pub struct AdminService {
    db: Arc<DatabaseConnection>,
    notifier: Notifier,
}

impl AdminService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn dashboard(&self) -> AppResult<AdminDashboard> {
        let db = self.db.as_ref();
        Ok(AdminDashboard {
            total_users: UserRepository::count(db).await?,
            active_users: UserRepository::count_active(db).await?,
            total_strategies: strategies::Entity::find().count(db).await?,
            running_strategies: strategies::Entity::find()
                .filter(strategies::Column::IsRunning.eq(true))
                .count(db)
                .await?,
            public_strategies: strategies::Entity::find()
                .filter(strategies::Column::IsPublic.eq(true))
                .count(db)
                .await?,
            total_api_keys: api_keys::Entity::find().count(db).await?,
            active_subscriptions: strategy_subscriptions::Entity::find()
                .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
                .count(db)
                .await?,
            open_tickets: support_tickets::Entity::find()
                .filter(support_tickets::Column::Status.ne(TicketStatus::Closed.as_str()))
                .count(db)
                .await?,
            total_wallet_balance: WalletRepository::total_balance(db, None).await?,
            total_revenue: WalletRepository::total_debits(db, None).await?,
        })
    }

    pub async fn users(&self, role: Option<&str>, search: Option<&str>) -> AppResult<Vec<users::Model>> {
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => Some(Role::parse(r)?),
            None => None,
        };
        UserRepository::search(self.db.as_ref(), role.as_ref().map(Role::as_str), search).await
    }

    pub async fn set_user_status(&self, admin: &users::Model, user_id: i64, is_active: bool) -> AppResult<users::Model> {
        if admin.id == user_id && !is_active {
            return Err(AppError::validation("you cannot deactivate your own account"));
        }
        let user = self.find_user(user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let user = UserRepository::update(self.db.as_ref(), active).await?;

        info!("👮 Admin {} set user {} active={}", admin.id, user.id, is_active);
        Ok(user)
    }

    pub async fn set_user_role(&self, admin: &users::Model, user_id: i64, req: RoleRequest) -> AppResult<users::Model> {
        let role = Role::parse(&req.role)?;
        if admin.id == user_id && role != Role::Admin {
            return Err(AppError::validation("you cannot remove your own admin role"));
        }
        if let Some(franchise_id) = req.franchise_id {
            franchises::Entity::find_by_id(franchise_id)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| AppError::validation(format!("franchise {} does not exist", franchise_id)))?;
        }

        let user = self.find_user(user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.as_str().to_string());
        if req.franchise_id.is_some() {
            active.franchise_id = Set(req.franchise_id);
        }
        active.updated_at = Set(Utc::now());
        let user = UserRepository::update(self.db.as_ref(), active).await?;

        info!("👮 Admin {} set role of user {} to {}", admin.id, user.id, role);
        Ok(user)
    }

    /// Top up a user's wallet
    pub async fn transfer(&self, admin: &users::Model, req: TransferRequest) -> AppResult<wallet_transactions::Model> {
        let note = optional_text("note", req.note.as_deref(), 500)?;
        let txn = self.db.begin().await?;
        UserRepository::find_by_id(&txn, req.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        let entry = WalletService::credit(&txn, req.user_id, req.amount, LedgerReason::AdminTransfer, note).await?;
        txn.commit().await?;

        info!(
            "💰 Admin {} transferred {} to user {}",
            admin.id, entry.amount, req.user_id
        );
        self.notifier.emit_dashboard_update(req.user_id, "wallet");
        Ok(entry)
    }

    pub async fn charges(&self) -> AppResult<Vec<charges::Model>> {
        let charges = charges::Entity::find()
            .order_by_asc(charges::Column::ChargeType)
            .all(self.db.as_ref())
            .await?;
        Ok(charges)
    }

    /// Create or update the price of a billable action
    pub async fn upsert_charge(&self, charge_type: &str, req: ChargeRequest) -> AppResult<charges::Model> {
        let charge_type = ChargeType::parse(charge_type)?;
        if req.amount < Decimal::ZERO {
            return Err(AppError::validation("charge amount cannot be negative"));
        }
        let amount = req.amount.round_dp(2);
        let description = optional_text("description", req.description.as_deref(), 500)?;

        let existing = charges::Entity::find()
            .filter(charges::Column::ChargeType.eq(charge_type.as_str()))
            .one(self.db.as_ref())
            .await?;

        let charge = match existing {
            Some(charge) => {
                let mut active: charges::ActiveModel = charge.into();
                active.amount = Set(amount);
                if description.is_some() {
                    active.description = Set(description);
                }
                if let Some(is_active) = req.is_active {
                    active.is_active = Set(is_active);
                }
                active.updated_at = Set(Utc::now());
                active.update(self.db.as_ref()).await?
            }
            None => {
                charges::ActiveModel {
                    charge_type: Set(charge_type.as_str().to_string()),
                    amount: Set(amount),
                    description: Set(description),
                    is_active: Set(req.is_active.unwrap_or(true)),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await?
            }
        };

        info!("Charge {} set to {} (active={})", charge.charge_type, charge.amount, charge.is_active);
        Ok(charge)
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        UserRepository::find_by_id(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }
}
