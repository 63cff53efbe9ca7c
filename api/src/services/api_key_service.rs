//! Broker API keys. Secrets are sealed before they reach the database and
//! only ever leave it masked.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{api_keys, strategy_subscriptions};
use shared::security::{mask, mask_secret, SecretBox, MASKED_SECRET};
use shared::{ApiKeyStatus, AppError, AppResult, Broker, ChargeType, Notifier, SubscriptionStatus};
use tracing::{info, warn};

use super::optional_text;
use super::wallet_service::WalletService;

/// Checks credentials against the broker after a key is stored
#[async_trait]
pub trait BrokerVerifier: Send + Sync {
    async fn verify(&self, broker: Broker, api_key: &str, api_secret: &str) -> AppResult<ApiKeyStatus>;
}

/// Leaves every key pending until a real broker integration confirms it
pub struct PendingVerifier;

#[async_trait]
impl BrokerVerifier for PendingVerifier {
    async fn verify(&self, _broker: Broker, _api_key: &str, _api_secret: &str) -> AppResult<ApiKeyStatus> {
        Ok(ApiKeyStatus::PendingVerification)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub broker: String,
    #[serde(default)]
    pub label: Option<String>,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateApiKeyRequest {
    pub label: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyView {
    pub id: i64,
    pub broker: String,
    pub label: Option<String>,
    pub api_key: String,
    pub api_secret: String,
    pub is_active: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ApiKeyService {
    db: Arc<DatabaseConnection>,
    secrets: SecretBox,
    verifier: Arc<dyn BrokerVerifier>,
    notifier: Notifier,
}

impl ApiKeyService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        secrets: SecretBox,
        verifier: Arc<dyn BrokerVerifier>,
        notifier: Notifier,
    ) -> Self {
        Self {
            db,
            secrets,
            verifier,
            notifier,
        }
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<ApiKeyView>> {
        let keys = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .order_by_desc(api_keys::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(keys.into_iter().map(|k| self.view(k)).collect())
    }

    /// Store a key, charging the `api_key` fee in the same transaction
    pub async fn create(&self, user_id: i64, req: CreateApiKeyRequest) -> AppResult<ApiKeyView> {
        let broker = Broker::parse(&req.broker)?;
        let label = optional_text("label", req.label.as_deref(), 100)?;
        let api_key = req.api_key.trim().to_string();
        let api_secret = req.api_secret.trim().to_string();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(AppError::validation("api_key and api_secret are required"));
        }
        let sealed_secret = self.secrets.seal(&api_secret)?;

        let txn = self.db.begin().await?;
        WalletService::lock_wallet(&txn, user_id).await?;

        let duplicates = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::Broker.eq(broker.as_str()))
            .filter(api_keys::Column::ApiKey.eq(api_key.as_str()))
            .filter(api_keys::Column::IsActive.eq(true))
            .count(&txn)
            .await?;
        if duplicates > 0 {
            return Err(AppError::conflict(format!("this {} API key is already connected", broker)));
        }

        let now = Utc::now();
        let key = api_keys::ActiveModel {
            user_id: Set(user_id),
            broker: Set(broker.as_str().to_string()),
            label: Set(label),
            api_key: Set(api_key.clone()),
            api_secret: Set(sealed_secret),
            is_active: Set(true),
            status: Set(ApiKeyStatus::PendingVerification.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let charged = WalletService::debit_for_charge(&txn, user_id, ChargeType::ApiKey, Some(key.id)).await?;
        txn.commit().await?;
        info!("🔑 User {} added {} API key {} (charged {})", user_id, broker, key.id, charged);

        let key = self.apply_verification(key, broker, &api_key, &api_secret).await?;
        self.notifier.emit_dashboard_update(user_id, "api_keys");
        Ok(self.view(key))
    }

    pub async fn update(&self, user_id: i64, id: i64, req: UpdateApiKeyRequest) -> AppResult<ApiKeyView> {
        let key = self.find_owned(user_id, id).await?;
        let mut active: api_keys::ActiveModel = key.into();
        if let Some(label) = req.label.as_deref() {
            active.label = Set(optional_text("label", Some(label), 100)?);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        let key = active.update(self.db.as_ref()).await?;

        self.notifier.emit_dashboard_update(user_id, "api_keys");
        Ok(self.view(key))
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> AppResult<()> {
        let key = self.find_owned(user_id, id).await?;
        let in_use = strategy_subscriptions::Entity::find()
            .filter(strategy_subscriptions::Column::ApiKeyId.eq(key.id))
            .filter(strategy_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .count(self.db.as_ref())
            .await?;
        if in_use > 0 {
            return Err(AppError::conflict("API key is used by an active subscription"));
        }

        api_keys::Entity::delete_by_id(key.id).exec(self.db.as_ref()).await?;
        info!("User {} deleted API key {}", user_id, id);
        self.notifier.emit_dashboard_update(user_id, "api_keys");
        Ok(())
    }

    async fn find_owned(&self, user_id: i64, id: i64) -> AppResult<api_keys::Model> {
        api_keys::Entity::find_by_id(id)
            .filter(api_keys::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("API key"))
    }

    /// A failing verifier never undoes the stored key; it stays pending
    async fn apply_verification(
        &self,
        key: api_keys::Model,
        broker: Broker,
        api_key: &str,
        api_secret: &str,
    ) -> AppResult<api_keys::Model> {
        let status = match self.verifier.verify(broker, api_key, api_secret).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Verification of API key {} failed: {}", key.id, e);
                return Ok(key);
            }
        };
        if status.as_str() == key.status {
            return Ok(key);
        }

        let mut active: api_keys::ActiveModel = key.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db.as_ref()).await?)
    }

    fn view(&self, key: api_keys::Model) -> ApiKeyView {
        let api_secret = match self.secrets.open(&key.api_secret) {
            Ok(secret) => mask_secret(&secret),
            Err(e) => {
                warn!("Cannot open secret of API key {}: {}", key.id, e);
                MASKED_SECRET.to_string()
            }
        };
        ApiKeyView {
            id: key.id,
            broker: key.broker,
            label: key.label,
            api_key: mask(&key.api_key, 4),
            api_secret,
            is_active: key.is_active,
            status: key.status,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}
