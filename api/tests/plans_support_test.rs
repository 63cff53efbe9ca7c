//! Plan purchases and the support ticket workflow.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::*;

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

async fn create_plan(app: &TestApp, admin: &str, name: &str, price: &str, days: i64) -> i64 {
    let (status, plan) = app
        .post(
            "/api/admin/plans",
            admin,
            json!({
                "name": name,
                "price": price,
                "duration_days": days,
                "features": ["Unlimited strategies", " ", "Priority support"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "plan create failed: {}", plan);
    assert_eq!(plan["features"], json!(["Unlimited strategies", "Priority support"]));
    plan["id"].as_i64().unwrap()
}

#[tokio::test]
async fn plans_are_listed_publicly() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    create_plan(&app, &admin, "Pro", "499", 30).await;
    let hidden = create_plan(&app, &admin, "Legacy", "99", 30).await;
    let (status, _) = app
        .put(&format!("/api/admin/plans/{}", hidden), &admin, json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, plans) = app.send(Method::GET, "/api/plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["name"], "Pro");
}

#[tokio::test]
async fn purchase_debits_and_extends_the_running_plan() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let plan_id = create_plan(&app, &admin, "Pro", "100", 30).await;
    let (token, user_id) = app.register("Asha", "asha@example.com").await;

    let (status, _) = app.post(&format!("/api/plans/{}/purchase", plan_id), &token, json!({})).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let (_, current) = app.get("/api/plans/current", &token).await;
    assert!(current.is_null());

    app.fund(&admin, user_id, "250").await;
    let (status, first) = app.post(&format!("/api/plans/{}/purchase", plan_id), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&first["wallet_balance"]), dec!(150));
    let first_start = timestamp(&first["subscription"]["starts_at"]);
    let first_end = timestamp(&first["subscription"]["expires_at"]);
    assert_eq!(first_end - first_start, Duration::days(30));

    let (status, second) = app.post(&format!("/api/plans/{}/purchase", plan_id), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&second["wallet_balance"]), dec!(50));
    assert_eq!(timestamp(&second["subscription"]["starts_at"]), first_end);
    assert_eq!(
        timestamp(&second["subscription"]["expires_at"]),
        first_end + Duration::days(30)
    );

    let (_, current) = app.get("/api/plans/current", &token).await;
    assert_eq!(timestamp(&current["subscription"]["expires_at"]), first_end + Duration::days(30));
    assert_eq!(current["plan"]["name"], "Pro");

    let (_, page) = app.get("/api/wallet/transactions", &token).await;
    assert_eq!(page["transactions"][0]["reason"], "plan_subscription");
    assert_eq!(page["transactions"][0]["note"], "Plan: Pro");
}

#[tokio::test]
async fn free_plans_need_no_balance() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let plan_id = create_plan(&app, &admin, "Starter", "0", 7).await;
    let (token, _) = app.register("Asha", "asha@example.com").await;

    let (status, _) = app.post(&format!("/api/plans/{}/purchase", plan_id), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, page) = app.get("/api/wallet/transactions", &token).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn plan_validation() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .post(
            "/api/admin/plans",
            &admin,
            json!({ "name": "Broken", "price": "-1", "duration_days": 30, "features": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/admin/plans",
            &admin,
            json!({ "name": "Forever", "price": "10", "duration_days": 0, "features": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (token, _) = app.register("Asha", "asha@example.com").await;
    let (status, _) = app
        .post(
            "/api/admin/plans",
            &token,
            json!({ "name": "Sneaky", "price": "0", "duration_days": 30, "features": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ticket_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (token, user_id) = app.register("Asha", "asha@example.com").await;

    let (status, ticket) = app
        .post(
            "/api/support/tickets",
            &token,
            json!({ "subject": "Order rejected", "message": "My **order** was rejected" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["priority"], "medium");
    assert_eq!(ticket["user_id"], user_id);
    assert_eq!(ticket["reference"].as_str().unwrap().len(), 36);
    let id = ticket["id"].as_i64().unwrap();

    let (status, reply) = app
        .post(
            &format!("/api/support/tickets/{}/replies", id),
            &admin,
            json!({ "message": "Checking with the broker" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["is_staff"], true);

    let (status, detail) = app.get(&format!("/api/support/tickets/{}", id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "in_progress");
    assert!(detail["message_html"].as_str().unwrap().contains("<strong>order</strong>"));
    assert_eq!(detail["replies"].as_array().unwrap().len(), 1);

    let (status, closed) = app
        .put(&format!("/api/support/tickets/{}/status", id), &token, json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (status, _) = app
        .post(&format!("/api/support/tickets/{}/replies", id), &token, json!({ "message": "Still broken" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .put(&format!("/api/support/tickets/{}/status", id), &token, json!({ "status": "open" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reopened) = app
        .put(&format!("/api/support/tickets/{}/status", id), &admin, json!({ "status": "open" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "open");
}

#[tokio::test]
async fn tickets_are_private_to_their_owner() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (owner, _) = app.register("Asha", "asha@example.com").await;
    let (other, _) = app.register("Ravi", "ravi@example.com").await;

    let (_, ticket) = app
        .post(
            "/api/support/tickets",
            &owner,
            json!({ "subject": "Billing", "message": "Charged twice", "priority": "high" }),
        )
        .await;
    let id = ticket["id"].as_i64().unwrap();

    let (status, _) = app.get(&format!("/api/support/tickets/{}", id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = app.get("/api/support/tickets", &other).await;
    assert!(list.as_array().unwrap().is_empty());

    let (_, list) = app.get("/api/support/tickets?status=open", &admin).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, list) = app.get("/api/support/tickets?status=closed", &admin).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = app.get("/api/support/tickets?status=pending", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
