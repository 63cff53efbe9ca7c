use std::sync::Arc;

use sea_orm::DatabaseConnection;
use shared::entity::users;
use shared::security::{SecretBox, TokenSigner};
use shared::{AppResult, Config, Notifier};

use crate::services::admin_service::AdminService;
use crate::services::api_key_service::{ApiKeyService, BrokerVerifier, PendingVerifier};
use crate::services::dashboard_service::DashboardService;
use crate::services::franchise_service::FranchiseService;
use crate::services::marketplace_service::MarketplaceService;
use crate::services::plan_service::PlanService;
use crate::services::strategy_service::StrategyService;
use crate::services::support_service::SupportService;
use crate::services::user_service::UserService;
use crate::services::wallet_service::WalletService;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub notifier: Notifier,
    pub user_service: Arc<UserService>,
    pub wallet_service: Arc<WalletService>,
    pub strategy_service: Arc<StrategyService>,
    pub marketplace_service: Arc<MarketplaceService>,
    pub api_key_service: Arc<ApiKeyService>,
    pub plan_service: Arc<PlanService>,
    pub support_service: Arc<SupportService>,
    pub admin_service: Arc<AdminService>,
    pub franchise_service: Arc<FranchiseService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config, notifier: Notifier) -> Self {
        Self::with_verifier(db, config, notifier, Arc::new(PendingVerifier))
    }

    pub fn with_verifier(
        db: DatabaseConnection,
        config: &Config,
        notifier: Notifier,
        verifier: Arc<dyn BrokerVerifier>,
    ) -> Self {
        let db = Arc::new(db);
        let tokens = TokenSigner::new(&config.token_secret, config.token_ttl_hours);
        let secrets = SecretBox::new(&config.encryption_key);

        AppState {
            user_service: Arc::new(UserService::new(db.clone(), tokens)),
            wallet_service: Arc::new(WalletService::new(db.clone())),
            strategy_service: Arc::new(StrategyService::new(db.clone(), notifier.clone())),
            marketplace_service: Arc::new(MarketplaceService::new(db.clone(), notifier.clone())),
            api_key_service: Arc::new(ApiKeyService::new(db.clone(), secrets, verifier, notifier.clone())),
            plan_service: Arc::new(PlanService::new(db.clone(), notifier.clone())),
            support_service: Arc::new(SupportService::new(db.clone(), notifier.clone())),
            admin_service: Arc::new(AdminService::new(db.clone(), notifier.clone())),
            franchise_service: Arc::new(FranchiseService::new(db.clone())),
            dashboard_service: Arc::new(DashboardService::new(db.clone())),
            db,
            notifier,
        }
    }

    /// Resolve a bearer token to an active user
    pub async fn authenticate(&self, token: &str) -> AppResult<users::Model> {
        self.user_service.authenticate(token).await
    }
}
