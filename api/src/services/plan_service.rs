use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{plan_subscriptions, plans};
use shared::{AppError, AppResult, LedgerReason, Notifier};
use tracing::{info, warn};

use super::required_text;
use super::wallet_service::WalletService;
use crate::repositories::wallet_repository::WalletRepository;

const MAX_DURATION_DAYS: i32 = 3650;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub price: Decimal,
    pub duration_days: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub duration_days: Option<i32>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: plans::Model,
    pub features: Vec<String>,
}

impl From<plans::Model> for PlanView {
    fn from(plan: plans::Model) -> Self {
        let features = serde_json::from_str(&plan.features).unwrap_or_else(|e| {
            warn!("Plan {} has unreadable features: {}", plan.id, e);
            Vec::new()
        });
        Self { plan, features }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub subscription: plan_subscriptions::Model,
    pub plan: PlanView,
    pub wallet_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CurrentPlan {
    pub subscription: plan_subscriptions::Model,
    pub plan: Option<PlanView>,
}

fn validate_price(price: Decimal) -> AppResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("price cannot be negative"));
    }
    Ok(price.round_dp(2))
}

fn validate_duration(days: i32) -> AppResult<i32> {
    if !(1..=MAX_DURATION_DAYS).contains(&days) {
        return Err(AppError::validation(format!(
            "duration_days must be between 1 and {}",
            MAX_DURATION_DAYS
        )));
    }
    Ok(days)
}

fn encode_features(features: &[String]) -> AppResult<String> {
    let cleaned: Vec<&str> = features.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect();
    serde_json::to_string(&cleaned).map_err(|e| AppError::Internal(e.into()))
}

/// A purchase made while a plan is still running extends it instead of overlapping
pub fn plan_period(
    now: DateTime<Utc>,
    current_expiry: Option<DateTime<Utc>>,
    duration_days: i32,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let starts_at = match current_expiry {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    (starts_at, starts_at + Duration::days(i64::from(duration_days)))
}

pub struct PlanService {
    db: Arc<DatabaseConnection>,
    notifier: Notifier,
}

impl PlanService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn list_active(&self) -> AppResult<Vec<PlanView>> {
        let plans = plans::Entity::find()
            .filter(plans::Column::IsActive.eq(true))
            .order_by_asc(plans::Column::Price)
            .order_by_asc(plans::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(plans.into_iter().map(PlanView::from).collect())
    }

    pub async fn purchase(&self, user_id: i64, plan_id: i64) -> AppResult<PurchaseResponse> {
        let txn = self.db.begin().await?;
        WalletService::lock_wallet(&txn, user_id).await?;

        let plan = plans::Entity::find_by_id(plan_id)
            .filter(plans::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("plan"))?;

        let now = Utc::now();
        let current = plan_subscriptions::Entity::find()
            .filter(plan_subscriptions::Column::UserId.eq(user_id))
            .filter(plan_subscriptions::Column::ExpiresAt.gt(now))
            .order_by_desc(plan_subscriptions::Column::ExpiresAt)
            .one(&txn)
            .await?;
        let (starts_at, expires_at) = plan_period(now, current.map(|c| c.expires_at), plan.duration_days);

        if plan.price > Decimal::ZERO {
            WalletService::debit_amount(
                &txn,
                user_id,
                plan.price,
                LedgerReason::PlanSubscription,
                Some(plan.id),
                Some(format!("Plan: {}", plan.name)),
            )
            .await?;
        }

        let subscription = plan_subscriptions::ActiveModel {
            user_id: Set(user_id),
            plan_id: Set(plan.id),
            price_paid: Set(plan.price),
            starts_at: Set(starts_at),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let wallet_balance = WalletRepository::find_by_user(&txn, user_id)
            .await?
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO);
        txn.commit().await?;

        info!(
            "🎟️ User {} purchased plan {} until {}",
            user_id, plan.id, subscription.expires_at
        );
        self.notifier.emit_dashboard_update(user_id, "plan");
        Ok(PurchaseResponse {
            subscription,
            plan: plan.into(),
            wallet_balance,
        })
    }

    /// Latest unexpired plan subscription of the user
    pub async fn current(&self, user_id: i64) -> AppResult<Option<CurrentPlan>> {
        let row = plan_subscriptions::Entity::find()
            .filter(plan_subscriptions::Column::UserId.eq(user_id))
            .filter(plan_subscriptions::Column::ExpiresAt.gt(Utc::now()))
            .find_also_related(plans::Entity)
            .order_by_desc(plan_subscriptions::Column::ExpiresAt)
            .one(self.db.as_ref())
            .await?;
        Ok(row.map(|(subscription, plan)| CurrentPlan {
            subscription,
            plan: plan.map(PlanView::from),
        }))
    }

    pub async fn create(&self, req: PlanRequest) -> AppResult<PlanView> {
        let plan = plans::ActiveModel {
            name: Set(required_text("name", &req.name, 100)?),
            price: Set(validate_price(req.price)?),
            duration_days: Set(validate_duration(req.duration_days)?),
            features: Set(encode_features(&req.features)?),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        info!("Plan {} '{}' created", plan.id, plan.name);
        Ok(plan.into())
    }

    pub async fn update(&self, id: i64, req: UpdatePlanRequest) -> AppResult<PlanView> {
        let plan = plans::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("plan"))?;

        let mut active: plans::ActiveModel = plan.into();
        if let Some(name) = req.name.as_deref() {
            active.name = Set(required_text("name", name, 100)?);
        }
        if let Some(price) = req.price {
            active.price = Set(validate_price(price)?);
        }
        if let Some(days) = req.duration_days {
            active.duration_days = Set(validate_duration(days)?);
        }
        if let Some(features) = req.features.as_deref() {
            active.features = Set(encode_features(features)?);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        let plan = active.update(self.db.as_ref()).await?;
        info!("Plan {} updated", plan.id);
        Ok(plan.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_period_starts_now_without_active_plan() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let (start, end) = plan_period(now, None, 30);
        assert_eq!(start, now);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_period_extends_running_plan() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let expiry = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let (start, end) = plan_period(now, Some(expiry), 10);
        assert_eq!(start, expiry);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_expired_plan_is_not_extended() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let expired = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(plan_period(now, Some(expired), 1).0, now);
    }

    #[test]
    fn test_plan_validation() {
        assert!(validate_price(dec!(-1)).is_err());
        assert_eq!(validate_price(dec!(499.999)).unwrap(), dec!(500.00));
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(365).is_ok());
        assert_eq!(encode_features(&[" Alerts ".into(), "".into()]).unwrap(), r#"["Alerts"]"#);
    }
}
