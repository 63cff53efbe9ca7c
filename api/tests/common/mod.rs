#![allow(dead_code)]
//! Shared harness for the HTTP integration tests: an in-memory SQLite
//! database with every migration applied and a fully wired router.

use std::str::FromStr;

use api::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use shared::{Config, Notifier};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@algodesk.test";
pub const ADMIN_PASSWORD: &str = "admin-pass-123";
pub const USER_PASSWORD: &str = "trader-pass-123";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        token_secret: "integration-test-token-secret".to_string(),
        token_ttl_hours: 1,
        encryption_key: "integration-test-encryption-key".to_string(),
        cors_origin: None,
        redis_url: None,
        run_migrations: true,
        admin_email: None,
        admin_password: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        // One pooled connection, otherwise every connection gets its own empty database
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let state = AppState::new(db, &test_config(), Notifier::new(64));
        state
            .user_service
            .bootstrap_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, text) = self.send_raw(method, uri, token, body).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, value)
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a trader and return `(token, user_id)`
    pub async fn register(&self, name: &str, email: &str) -> (String, i64) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": USER_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    pub async fn fund(&self, admin: &str, user_id: i64, amount: &str) {
        let (status, body) = self
            .post(
                "/api/admin/wallet/transfer",
                admin,
                json!({ "user_id": user_id, "amount": amount, "note": "top up" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "transfer failed: {}", body);
    }

    pub async fn set_charge(&self, admin: &str, charge_type: &str, amount: &str) {
        let (status, body) = self
            .put(
                &format!("/api/admin/charges/{}", charge_type),
                admin,
                json!({ "amount": amount, "is_active": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "charge update failed: {}", body);
    }

    pub async fn balance(&self, token: &str) -> Decimal {
        let (status, body) = self.get("/api/wallet", token).await;
        assert_eq!(status, StatusCode::OK);
        decimal(&body["balance"])
    }

    pub async fn create_strategy(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self.post("/api/strategies", token, strategy_payload(name)).await;
        assert_eq!(status, StatusCode::CREATED, "strategy create failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn create_api_key(&self, token: &str, api_key: &str) -> (StatusCode, Value) {
        self.post(
            "/api/api-keys",
            token,
            json!({
                "broker": "zerodha",
                "label": "main account",
                "api_key": api_key,
                "api_secret": "s3cr3t-value"
            }),
        )
        .await
    }
}

pub fn strategy_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Buys oversold dips",
        "segment": "equity",
        "symbol": "reliance",
        "timeframe": "15m",
        "capital": "25000",
        "rules": [
            { "indicator": "RSI", "period": 14, "comparison": "<", "value": 30, "action": "entry" },
            { "indicator": "RSI", "period": 14, "comparison": ">", "value": 70, "action": "exit" }
        ]
    })
}

/// Decimals travel as strings; SQLite may hand them back with a different scale
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}
