use sea_orm::{prelude::*, ConnectionTrait, QueryOrder};
use shared::entity::{strategies, strategy_subscriptions};
use shared::{AppError, AppResult, SubscriptionStatus};

pub struct StrategyRepository;

impl StrategyRepository {
    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> AppResult<Option<strategies::Model>> {
        Ok(strategies::Entity::find_by_id(id).one(db).await?)
    }

    /// Strategy owned by `user_id`; anybody else's strategy is reported as missing
    pub async fn find_owned<C: ConnectionTrait>(db: &C, id: i64, user_id: i64) -> AppResult<strategies::Model> {
        strategies::Entity::find_by_id(id)
            .filter(strategies::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("strategy"))
    }

    pub async fn list_by_user<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Vec<strategies::Model>> {
        let strategies = strategies::Entity::find()
            .filter(strategies::Column::UserId.eq(user_id))
            .order_by_desc(strategies::Column::CreatedAt)
            .order_by_desc(strategies::Column::Id)
            .all(db)
            .await?;
        Ok(strategies)
    }

    pub async fn list_all<C: ConnectionTrait>(db: &C) -> AppResult<Vec<strategies::Model>> {
        let strategies = strategies::Entity::find()
            .order_by_desc(strategies::Column::CreatedAt)
            .order_by_desc(strategies::Column::Id)
            .all(db)
            .await?;
        Ok(strategies)
    }

    pub async fn count_by_user<C: ConnectionTrait>(db: &C, user_id: i64, running_only: bool) -> AppResult<u64> {
        let mut query = strategies::Entity::find().filter(strategies::Column::UserId.eq(user_id));
        if running_only {
            query = query.filter(strategies::Column::IsRunning.eq(true));
        }
        Ok(query.count(db).await?)
    }

    /// Marks every active subscription of a strategy as cancelled
    pub async fn cancel_subscriptions<C: ConnectionTrait>(db: &C, strategy_id: i64) -> AppResult<u64> {
        let result = strategy_subscriptions::Entity::update_many()
            .col_expr(
                strategy_subscriptions::Column::Status,
                Expr::value(SubscriptionStatus::Cancelled.as_str()),
            )
            .col_expr(strategy_subscriptions::Column::CancelledAt, Expr::value(chrono::Utc::now()))
            .filter(strategy_subscriptions::Column::StrategyId.eq(strategy_id))
            .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
