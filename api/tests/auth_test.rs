//! Registration, login and bearer-token handling.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn register_returns_token_and_creates_empty_wallet() {
    let app = TestApp::new().await;
    let (token, user_id) = app.register("Asha", "  Asha@Example.COM ").await;

    let (status, me) = app.get("/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id);
    assert_eq!(me["email"], "asha@example.com");
    assert_eq!(me["role"], "user");
    assert!(me.get("password_hash").is_none());
    assert!(decimal(&me["wallet_balance"]).is_zero());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new().await;
    app.register("Asha", "asha@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Other", "email": "ASHA@example.com", "password": USER_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Short", "email": "short@example.com", "password": "1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Lost",
                "email": "lost@example.com",
                "password": USER_PASSWORD,
                "franchise_code": "NOPE"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    app.register("Asha", "asha@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": "not-the-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("invalid email or password"));

    let token = app.login("asha@example.com", USER_PASSWORD).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", "forged.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_users_cannot_log_in_or_use_tokens() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (token, user_id) = app.register("Asha", "asha@example.com").await;

    let (status, body) = app
        .put(&format!("/api/admin/users/{}/status", user_id), &admin, json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": USER_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.send(Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
