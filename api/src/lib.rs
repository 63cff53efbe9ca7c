//! REST API for the AlgoDesk strategy platform.

pub mod auth;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod ws;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::routes::{admin, api_keys, auth as auth_routes, dashboard, franchise, marketplace, plans, strategies, support, wallet};
pub use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/register", post(auth_routes::register))
        .route("/login", post(auth_routes::login))
        .route("/me", get(auth_routes::me));

    let strategies = Router::new()
        .route("/", get(strategies::list).post(strategies::create))
        .route("/preview-code", post(strategies::preview_code))
        .route(
            "/:id",
            get(strategies::get).put(strategies::update).delete(strategies::delete),
        )
        .route("/:id/start", post(strategies::start))
        .route("/:id/stop", post(strategies::stop))
        .route("/:id/visibility", put(strategies::visibility))
        .route("/:id/code", get(strategies::code));

    let api_keys = Router::new()
        .route("/", get(api_keys::list).post(api_keys::create))
        .route("/:id", put(api_keys::update).delete(api_keys::delete));

    let plans = Router::new()
        .route("/", get(plans::list))
        .route("/current", get(plans::current))
        .route("/:id/purchase", post(plans::purchase));

    let support = Router::new()
        .route("/tickets", get(support::list).post(support::create))
        .route("/tickets/:id", get(support::get))
        .route("/tickets/:id/replies", post(support::reply))
        .route("/tickets/:id/status", put(support::set_status));

    let admin = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/users/:id/status", put(admin::set_user_status))
        .route("/users/:id/role", put(admin::set_user_role))
        .route("/wallet/transfer", post(admin::transfer))
        .route("/charges", get(admin::charges))
        .route("/charges/:charge_type", put(admin::upsert_charge))
        .route("/strategies", get(admin::strategies).post(admin::create_strategy))
        .route("/plans", post(admin::create_plan))
        .route("/plans/:id", put(admin::update_plan))
        .route("/franchises", get(admin::franchises).post(admin::create_franchise))
        .route("/franchises/:id", put(admin::update_franchise))
        .route("/franchises/:id/users", get(admin::franchise_users));

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/strategies", strategies)
        .route("/marketplace", get(marketplace::list))
        .route("/marketplace/:id/subscribe", post(marketplace::subscribe))
        .route("/subscriptions", get(marketplace::subscriptions))
        .route("/subscriptions/:id", delete(marketplace::cancel_subscription))
        .nest("/api-keys", api_keys)
        .route("/wallet", get(wallet::summary))
        .route("/wallet/transactions", get(wallet::transactions))
        .nest("/plans", plans)
        .nest("/support", support)
        .nest("/admin", admin)
        .route("/franchise/dashboard", get(franchise::dashboard))
        .route("/franchise/users", get(franchise::users))
        .route("/dashboard", get(dashboard::user_dashboard));

    Router::new()
        .route("/health", get(dashboard::health_check))
        .route("/ws", get(ws::ws_handler))
        .nest("/api", api)
        .fallback(auth_routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
