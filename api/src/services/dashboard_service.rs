use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection};
use serde::Serialize;
use shared::entity::{api_keys, strategy_subscriptions, support_tickets};
use shared::{AppResult, SubscriptionStatus, TicketStatus};

use crate::repositories::strategy_repository::StrategyRepository;
use crate::repositories::wallet_repository::WalletRepository;

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub strategies: u64,
    pub running_strategies: u64,
    pub active_subscriptions: u64,
    pub api_keys: u64,
    pub wallet_balance: Decimal,
    pub open_tickets: u64,
}

pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn for_user(&self, user_id: i64) -> AppResult<UserDashboard> {
        let db = self.db.as_ref();
        Ok(UserDashboard {
            strategies: StrategyRepository::count_by_user(db, user_id, false).await?,
            running_strategies: StrategyRepository::count_by_user(db, user_id, true).await?,
            active_subscriptions: strategy_subscriptions::Entity::find()
                .filter(strategy_subscriptions::Column::UserId.eq(user_id))
                .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
                .count(db)
                .await?,
            api_keys: api_keys::Entity::find()
                .filter(api_keys::Column::UserId.eq(user_id))
                .count(db)
                .await?,
            wallet_balance: WalletRepository::find_by_user(db, user_id)
                .await?
                .map(|w| w.balance)
                .unwrap_or(Decimal::ZERO),
            open_tickets: support_tickets::Entity::find()
                .filter(support_tickets::Column::UserId.eq(user_id))
                .filter(support_tickets::Column::Status.ne(TicketStatus::Closed.as_str()))
                .count(db)
                .await?,
        })
    }
}
