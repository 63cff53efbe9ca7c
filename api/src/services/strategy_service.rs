//! Strategy CRUD and lifecycle. Generated Python is kept in sync with the
//! stored rules on every write.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::codegen::{generate_strategy_code, StrategyRule};
use shared::entity::{api_keys, strategies, users};
use shared::{validate_timeframe, AppError, AppResult, Notifier, Role, Segment};
use tracing::{info, warn};

use super::{optional_text, required_text, single_line_text};
use crate::repositories::strategy_repository::StrategyRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub segment: String,
    pub symbol: String,
    pub timeframe: String,
    pub capital: Decimal,
    pub rules: Vec<StrategyRule>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStrategyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub segment: Option<String>,
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub capital: Option<Decimal>,
    pub rules: Option<Vec<StrategyRule>>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewCodeRequest {
    pub name: String,
    pub timeframe: String,
    pub rules: Vec<StrategyRule>,
}

/// Strategy as returned to clients, with its rules decoded
#[derive(Debug, Serialize)]
pub struct StrategyView {
    #[serde(flatten)]
    pub strategy: strategies::Model,
    pub rules: Vec<StrategyRule>,
}

impl From<strategies::Model> for StrategyView {
    fn from(strategy: strategies::Model) -> Self {
        let rules = serde_json::from_str(&strategy.rules).unwrap_or_else(|e| {
            warn!("Strategy {} has unreadable rules: {}", strategy.id, e);
            Vec::new()
        });
        Self { strategy, rules }
    }
}

fn validate_capital(capital: Decimal) -> AppResult<Decimal> {
    if capital <= Decimal::ZERO {
        return Err(AppError::validation("capital must be greater than zero"));
    }
    Ok(capital)
}

fn normalize_symbol(symbol: &str) -> AppResult<String> {
    Ok(required_text("symbol", symbol, 64)?.to_uppercase())
}

fn encode_rules(rules: &[StrategyRule]) -> AppResult<String> {
    serde_json::to_string(rules).map_err(|e| AppError::Internal(e.into()))
}

pub struct StrategyService {
    db: Arc<DatabaseConnection>,
    notifier: Notifier,
}

impl StrategyService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<StrategyView>> {
        let strategies = StrategyRepository::list_by_user(self.db.as_ref(), user_id).await?;
        Ok(strategies.into_iter().map(StrategyView::from).collect())
    }

    pub async fn list_all(&self) -> AppResult<Vec<StrategyView>> {
        let strategies = StrategyRepository::list_all(self.db.as_ref()).await?;
        Ok(strategies.into_iter().map(StrategyView::from).collect())
    }

    /// Admin strategies are published to the marketplace straight away
    pub async fn create(&self, user_id: i64, req: StrategyRequest, admin_strategy: bool) -> AppResult<StrategyView> {
        let name = single_line_text("name", &req.name, 100)?;
        let description = optional_text("description", req.description.as_deref(), 2000)?;
        let segment = Segment::parse(&req.segment)?;
        let symbol = normalize_symbol(&req.symbol)?;
        let timeframe = req.timeframe.trim().to_string();
        validate_timeframe(&timeframe)?;
        let capital = validate_capital(req.capital)?;
        let generated_code = generate_strategy_code(&name, &timeframe, &req.rules)?;

        let now = Utc::now();
        let strategy = strategies::ActiveModel {
            user_id: Set(user_id),
            name: Set(name),
            description: Set(description),
            segment: Set(segment.as_str().to_string()),
            symbol: Set(symbol),
            timeframe: Set(timeframe),
            capital: Set(capital),
            rules: Set(encode_rules(&req.rules)?),
            generated_code: Set(generated_code),
            is_running: Set(false),
            is_public: Set(admin_strategy),
            is_admin_strategy: Set(admin_strategy),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!("📈 Strategy {} '{}' created by user {}", strategy.id, strategy.name, user_id);
        self.notify(user_id, strategy.id, "created");
        Ok(strategy.into())
    }

    /// Owners see their own strategies, admins see every strategy
    pub async fn get(&self, actor: &users::Model, id: i64) -> AppResult<StrategyView> {
        Ok(self.find_visible(actor, id).await?.into())
    }

    pub async fn code(&self, actor: &users::Model, id: i64) -> AppResult<String> {
        Ok(self.find_visible(actor, id).await?.generated_code)
    }

    pub async fn update(&self, user_id: i64, id: i64, req: UpdateStrategyRequest) -> AppResult<StrategyView> {
        let strategy = StrategyRepository::find_owned(self.db.as_ref(), id, user_id).await?;
        if strategy.is_running && req.rules.is_some() {
            return Err(AppError::conflict("stop the strategy before changing its rules"));
        }

        let mut name = strategy.name.clone();
        let mut timeframe = strategy.timeframe.clone();
        let mut rules: Vec<StrategyRule> = StrategyView::from(strategy.clone()).rules;
        let mut regenerate = false;
        let mut active: strategies::ActiveModel = strategy.into();

        if let Some(value) = req.name.as_deref() {
            name = single_line_text("name", value, 100)?;
            active.name = Set(name.clone());
            regenerate = true;
        }
        if let Some(value) = req.description.as_deref() {
            active.description = Set(optional_text("description", Some(value), 2000)?);
        }
        if let Some(value) = req.segment.as_deref() {
            active.segment = Set(Segment::parse(value)?.as_str().to_string());
        }
        if let Some(value) = req.symbol.as_deref() {
            active.symbol = Set(normalize_symbol(value)?);
        }
        if let Some(value) = req.timeframe.as_deref() {
            validate_timeframe(value.trim())?;
            timeframe = value.trim().to_string();
            active.timeframe = Set(timeframe.clone());
            regenerate = true;
        }
        if let Some(value) = req.capital {
            active.capital = Set(validate_capital(value)?);
        }
        if let Some(value) = req.rules {
            active.rules = Set(encode_rules(&value)?);
            rules = value;
            regenerate = true;
        }
        if regenerate {
            active.generated_code = Set(generate_strategy_code(&name, &timeframe, &rules)?);
        }
        active.updated_at = Set(Utc::now());

        let strategy = active.update(self.db.as_ref()).await?;
        info!("Strategy {} updated by user {}", strategy.id, user_id);
        self.notify(user_id, strategy.id, "updated");
        Ok(strategy.into())
    }

    /// Deleting cancels every active subscription to the strategy
    pub async fn delete(&self, user_id: i64, id: i64) -> AppResult<()> {
        let txn = self.db.begin().await?;
        let strategy = StrategyRepository::find_owned(&txn, id, user_id).await?;
        if strategy.is_running {
            return Err(AppError::conflict("stop the strategy before deleting it"));
        }
        let cancelled = StrategyRepository::cancel_subscriptions(&txn, strategy.id).await?;
        strategies::Entity::delete_by_id(strategy.id).exec(&txn).await?;
        txn.commit().await?;

        info!("🗑️ Strategy {} deleted, {} subscriptions cancelled", id, cancelled);
        self.notify(user_id, id, "deleted");
        Ok(())
    }

    pub async fn start(&self, user_id: i64, id: i64) -> AppResult<StrategyView> {
        let strategy = StrategyRepository::find_owned(self.db.as_ref(), id, user_id).await?;
        let active_keys = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await?;
        if active_keys == 0 {
            return Err(AppError::validation("add an active broker API key before starting a strategy"));
        }
        if strategy.is_running {
            return Ok(strategy.into());
        }

        let strategy = self.set_running(strategy, true).await?;
        info!("▶️ Strategy {} started", strategy.id);
        self.notify(user_id, strategy.id, "started");
        Ok(strategy.into())
    }

    pub async fn stop(&self, user_id: i64, id: i64) -> AppResult<StrategyView> {
        let strategy = StrategyRepository::find_owned(self.db.as_ref(), id, user_id).await?;
        if !strategy.is_running {
            return Ok(strategy.into());
        }

        let strategy = self.set_running(strategy, false).await?;
        info!("⏹️ Strategy {} stopped", strategy.id);
        self.notify(user_id, strategy.id, "stopped");
        Ok(strategy.into())
    }

    pub async fn set_visibility(&self, user_id: i64, id: i64, is_public: bool) -> AppResult<StrategyView> {
        let strategy = StrategyRepository::find_owned(self.db.as_ref(), id, user_id).await?;
        let mut active: strategies::ActiveModel = strategy.into();
        active.is_public = Set(is_public);
        active.updated_at = Set(Utc::now());
        let strategy = active.update(self.db.as_ref()).await?;

        self.notify(user_id, strategy.id, if is_public { "published" } else { "unpublished" });
        Ok(strategy.into())
    }

    pub fn preview(&self, req: PreviewCodeRequest) -> AppResult<String> {
        let name = single_line_text("name", &req.name, 100)?;
        validate_timeframe(req.timeframe.trim())?;
        generate_strategy_code(&name, req.timeframe.trim(), &req.rules)
    }

    async fn find_visible(&self, actor: &users::Model, id: i64) -> AppResult<strategies::Model> {
        if actor.role == Role::Admin.as_str() {
            StrategyRepository::find_by_id(self.db.as_ref(), id)
                .await?
                .ok_or_else(|| AppError::not_found("strategy"))
        } else {
            StrategyRepository::find_owned(self.db.as_ref(), id, actor.id).await
        }
    }

    async fn set_running(&self, strategy: strategies::Model, running: bool) -> AppResult<strategies::Model> {
        let mut active: strategies::ActiveModel = strategy.into();
        active.is_running = Set(running);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db.as_ref()).await?)
    }

    fn notify(&self, user_id: i64, strategy_id: i64, action: &str) {
        self.notifier.emit_strategy_update(user_id, strategy_id, action);
        self.notifier.emit_dashboard_update(user_id, "strategies");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::codegen::{Comparison, RuleAction};

    #[test]
    fn test_capital_must_be_positive() {
        assert!(validate_capital(dec!(0)).is_err());
        assert!(validate_capital(dec!(-5)).is_err());
        assert_eq!(validate_capital(dec!(25000.50)).unwrap(), dec!(25000.50));
    }

    #[test]
    fn test_symbol_is_uppercased() {
        assert_eq!(normalize_symbol(" nifty50 ").unwrap(), "NIFTY50");
        assert!(normalize_symbol("  ").is_err());
    }

    #[test]
    fn test_view_decodes_stored_rules() {
        let rules = vec![StrategyRule::threshold("RSI", 14, Comparison::Lt, 30.0, RuleAction::Entry)];
        let now = Utc::now();
        let model = strategies::Model {
            id: 1,
            user_id: 1,
            name: "RSI dip".into(),
            description: None,
            segment: "crypto".into(),
            symbol: "BTCUSDT".into(),
            timeframe: "1h".into(),
            capital: dec!(1000),
            rules: encode_rules(&rules).unwrap(),
            generated_code: String::new(),
            is_running: false,
            is_public: false,
            is_admin_strategy: false,
            created_at: now,
            updated_at: now,
        };
        let view = StrategyView::from(model);
        assert_eq!(view.rules, rules);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rules"][0]["indicator"], "RSI");
        assert!(json.get("generated_code").is_none());
    }
}
