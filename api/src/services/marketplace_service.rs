//! Public strategy marketplace and strategy subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, QuerySelect, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{api_keys, strategies, strategy_subscriptions, users};
use shared::{AppError, AppResult, ChargeType, Notifier, SubscriptionStatus};
use tracing::info;

use super::wallet_service::WalletService;

#[derive(Debug, Serialize)]
pub struct MarketplaceEntry {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub segment: String,
    pub symbol: String,
    pub timeframe: String,
    pub capital: Decimal,
    pub is_admin_strategy: bool,
    pub owner_id: i64,
    pub owner_name: Option<String>,
    pub subscriber_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub api_key_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: strategy_subscriptions::Model,
    pub strategy_name: Option<String>,
}

pub struct MarketplaceService {
    db: Arc<DatabaseConnection>,
    notifier: Notifier,
}

impl MarketplaceService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Public strategies, admin-curated ones first
    pub async fn list(&self) -> AppResult<Vec<MarketplaceEntry>> {
        let rows = strategies::Entity::find()
            .filter(strategies::Column::IsPublic.eq(true))
            .find_also_related(users::Entity)
            .order_by_desc(strategies::Column::IsAdminStrategy)
            .order_by_desc(strategies::Column::CreatedAt)
            .order_by_desc(strategies::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let counts: HashMap<i64, i64> = strategy_subscriptions::Entity::find()
            .select_only()
            .column(strategy_subscriptions::Column::StrategyId)
            .column_as(strategy_subscriptions::Column::Id.count(), "subscribers")
            .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .group_by(strategy_subscriptions::Column::StrategyId)
            .into_tuple::<(i64, i64)>()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|(strategy, owner)| MarketplaceEntry {
                subscriber_count: counts.get(&strategy.id).copied().unwrap_or(0),
                owner_name: owner.map(|o| o.name),
                id: strategy.id,
                name: strategy.name,
                description: strategy.description,
                segment: strategy.segment,
                symbol: strategy.symbol,
                timeframe: strategy.timeframe,
                capital: strategy.capital,
                is_admin_strategy: strategy.is_admin_strategy,
                owner_id: strategy.user_id,
                created_at: strategy.created_at,
            })
            .collect())
    }

    /// Charge the subscription fee and record the subscription atomically
    pub async fn subscribe(
        &self,
        user_id: i64,
        strategy_id: i64,
        req: SubscribeRequest,
    ) -> AppResult<strategy_subscriptions::Model> {
        let txn = self.db.begin().await?;
        WalletService::lock_wallet(&txn, user_id).await?;

        let strategy = strategies::Entity::find_by_id(strategy_id)
            .filter(strategies::Column::IsPublic.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("strategy"))?;

        if strategy.user_id == user_id {
            return Err(AppError::validation("you cannot subscribe to your own strategy"));
        }

        let already_subscribed = strategy_subscriptions::Entity::find()
            .filter(strategy_subscriptions::Column::UserId.eq(user_id))
            .filter(strategy_subscriptions::Column::StrategyId.eq(strategy.id))
            .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .count(&txn)
            .await?;
        if already_subscribed > 0 {
            return Err(AppError::conflict("already subscribed to this strategy"));
        }

        if let Some(api_key_id) = req.api_key_id {
            api_keys::Entity::find_by_id(api_key_id)
                .filter(api_keys::Column::UserId.eq(user_id))
                .filter(api_keys::Column::IsActive.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::validation("api_key_id must reference one of your active API keys"))?;
        }

        let price_paid =
            WalletService::debit_for_charge(&txn, user_id, ChargeType::StrategySubscription, Some(strategy.id)).await?;

        let subscription = strategy_subscriptions::ActiveModel {
            user_id: Set(user_id),
            strategy_id: Set(strategy.id),
            api_key_id: Set(req.api_key_id),
            status: Set(SubscriptionStatus::Active.as_str().to_string()),
            price_paid: Set(price_paid),
            created_at: Set(Utc::now()),
            cancelled_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            "🛒 User {} subscribed to strategy {} for {}",
            user_id, strategy.id, price_paid
        );
        self.notifier.emit_strategy_update(strategy.user_id, strategy.id, "subscribed");
        self.notifier.emit_dashboard_update(user_id, "subscriptions");
        Ok(subscription)
    }

    pub async fn list_subscriptions(&self, user_id: i64) -> AppResult<Vec<SubscriptionView>> {
        let rows = strategy_subscriptions::Entity::find()
            .filter(strategy_subscriptions::Column::UserId.eq(user_id))
            .find_also_related(strategies::Entity)
            .order_by_desc(strategy_subscriptions::Column::CreatedAt)
            .order_by_desc(strategy_subscriptions::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(subscription, strategy)| SubscriptionView {
                subscription,
                strategy_name: strategy.map(|s| s.name),
            })
            .collect())
    }

    /// Cancelling stops the subscription; the fee is not refunded
    pub async fn cancel(&self, user_id: i64, subscription_id: i64) -> AppResult<strategy_subscriptions::Model> {
        let subscription = strategy_subscriptions::Entity::find_by_id(subscription_id)
            .filter(strategy_subscriptions::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("subscription"))?;

        if subscription.status == SubscriptionStatus::Cancelled.as_str() {
            return Err(AppError::conflict("subscription is already cancelled"));
        }

        let mut active: strategy_subscriptions::ActiveModel = subscription.into();
        active.status = Set(SubscriptionStatus::Cancelled.as_str().to_string());
        active.cancelled_at = Set(Some(Utc::now()));
        let subscription = active.update(self.db.as_ref()).await?;

        info!("Subscription {} cancelled by user {}", subscription.id, user_id);
        self.notifier.emit_dashboard_update(user_id, "subscriptions");
        Ok(subscription)
    }
}
