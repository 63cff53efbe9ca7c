//! Charged actions: API keys and strategy subscriptions debit the wallet
//! atomically with the row they pay for.

mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::*;

#[tokio::test]
async fn charges_are_seeded_free() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, charges) = app.get("/api/admin/charges", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let charges = charges.as_array().unwrap();
    assert_eq!(charges.len(), 2);
    assert!(charges.iter().all(|c| decimal(&c["amount"]).is_zero()));

    let (token, _) = app.register("Asha", "asha@example.com").await;
    let (status, _) = app.create_api_key(&token, "ABCD1234WXYZ").await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, page) = app.get("/api/wallet/transactions", &token).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn insufficient_balance_leaves_nothing_behind() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.set_charge(&admin, "api_key", "50").await;
    let (token, _) = app.register("Asha", "asha@example.com").await;

    let (status, body) = app.create_api_key(&token, "ABCD1234WXYZ").await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("insufficient wallet balance"));

    let (_, keys) = app.get("/api/api-keys", &token).await;
    assert!(keys.as_array().unwrap().is_empty());
    let (_, page) = app.get("/api/wallet/transactions", &token).await;
    assert_eq!(page["total"], 0);
    assert!(app.balance(&token).await.is_zero());
}

#[tokio::test]
async fn api_key_creation_debits_the_charge() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.set_charge(&admin, "api_key", "50").await;
    let (token, user_id) = app.register("Asha", "asha@example.com").await;
    app.fund(&admin, user_id, "120").await;

    let (status, key) = app.create_api_key(&token, "ABCD1234WXYZ").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.balance(&token).await, dec!(70));

    let (_, page) = app.get("/api/wallet/transactions", &token).await;
    assert_eq!(page["total"], 2);
    let latest = &page["transactions"][0];
    assert_eq!(latest["kind"], "debit");
    assert_eq!(latest["reason"], "api_key");
    assert_eq!(latest["reference_id"], key["id"]);
    assert_eq!(decimal(&latest["amount"]), dec!(50));
    assert_eq!(decimal(&latest["balance_after"]), dec!(70));

    let credit = &page["transactions"][1];
    assert_eq!(credit["kind"], "credit");
    assert_eq!(credit["reason"], "admin_transfer");
    assert_eq!(credit["note"], "top up");
}

#[tokio::test]
async fn api_keys_are_masked_and_deduplicated() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Asha", "asha@example.com").await;

    let (status, key) = app.create_api_key(&token, "ABCD1234WXYZ").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(key["api_key"], "ABCD...WXYZ");
    assert_eq!(key["api_secret"], "s3...ue");
    assert_eq!(key["status"], "pending_verification");
    assert_eq!(key["broker"], "zerodha");

    let (status, _) = app.create_api_key(&token, "ABCD1234WXYZ").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/api-keys",
            &token,
            json!({ "broker": "robinhood", "api_key": "KEY", "api_secret": "SECRET" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = key["id"].as_i64().unwrap();
    let (status, updated) = app
        .put(&format!("/api/api-keys/{}", id), &token, json!({ "label": "renamed", "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["label"], "renamed");
    assert_eq!(updated["is_active"], false);

    let (status, _) = app.delete(&format!("/api/api-keys/{}", id), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn subscribing_debits_the_subscription_charge() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.set_charge(&admin, "strategy_subscription", "25.50").await;

    let (author, _) = app.register("Asha", "asha@example.com").await;
    let strategy_id = app.create_strategy(&author, "public edge").await;
    app.put(
        &format!("/api/strategies/{}/visibility", strategy_id),
        &author,
        json!({ "is_public": true }),
    )
    .await;

    let (subscriber, subscriber_id) = app.register("Ravi", "ravi@example.com").await;
    let uri = format!("/api/marketplace/{}/subscribe", strategy_id);

    let (status, _) = app.post(&uri, &subscriber, json!({})).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let (_, subs) = app.get("/api/subscriptions", &subscriber).await;
    assert!(subs.as_array().unwrap().is_empty());

    app.fund(&admin, subscriber_id, "100").await;
    let (status, subscription) = app.post(&uri, &subscriber, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["status"], "active");
    assert_eq!(decimal(&subscription["price_paid"]), dec!(25.50));
    assert_eq!(app.balance(&subscriber).await, dec!(74.50));

    let (_, page) = app.get("/api/wallet/transactions?limit=1", &subscriber).await;
    assert_eq!(page["limit"], 1);
    assert_eq!(page["total"], 2);
    assert_eq!(page["transactions"][0]["reason"], "strategy_subscription");
    assert_eq!(page["transactions"][0]["reference_id"], strategy_id);

    let (status, _) = app.post(&uri, &subscriber, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.balance(&subscriber).await, dec!(74.50));

    let (_, market) = app.get("/api/marketplace", &subscriber).await;
    assert_eq!(market[0]["subscriber_count"], 1);
}

#[tokio::test]
async fn concurrent_duplicate_purchases_charge_once() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.set_charge(&admin, "strategy_subscription", "10").await;
    app.set_charge(&admin, "api_key", "5").await;

    let (author, _) = app.register("Asha", "asha@example.com").await;
    let strategy_id = app.create_strategy(&author, "public edge").await;
    app.put(
        &format!("/api/strategies/{}/visibility", strategy_id),
        &author,
        json!({ "is_public": true }),
    )
    .await;

    let (subscriber, subscriber_id) = app.register("Ravi", "ravi@example.com").await;
    app.fund(&admin, subscriber_id, "100").await;

    let uri = format!("/api/marketplace/{}/subscribe", strategy_id);
    let ((first, _), (second, _)) = tokio::join!(
        app.post(&uri, &subscriber, json!({})),
        app.post(&uri, &subscriber, json!({}))
    );
    let mut statuses = vec![first, second];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let key = json!({ "broker": "zerodha", "api_key": "RAVIKEY12345", "api_secret": "s3cr3t-value" });
    let ((first, _), (second, _)) = tokio::join!(
        app.post("/api/api-keys", &subscriber, key.clone()),
        app.post("/api/api-keys", &subscriber, key.clone())
    );
    let mut statuses = vec![first, second];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let (_, subs) = app.get("/api/subscriptions", &subscriber).await;
    assert_eq!(subs.as_array().unwrap().len(), 1);
    let (_, keys) = app.get("/api/api-keys", &subscriber).await;
    assert_eq!(keys.as_array().unwrap().len(), 1);
    assert_eq!(app.balance(&subscriber).await, dec!(85));
}

#[tokio::test]
async fn subscription_rules() {
    let app = TestApp::new().await;
    let (author, _) = app.register("Asha", "asha@example.com").await;
    let private_id = app.create_strategy(&author, "private").await;
    let public_id = app.create_strategy(&author, "public").await;
    app.put(
        &format!("/api/strategies/{}/visibility", public_id),
        &author,
        json!({ "is_public": true }),
    )
    .await;
    let (subscriber, _) = app.register("Ravi", "ravi@example.com").await;

    let (status, _) = app
        .post(&format!("/api/marketplace/{}/subscribe", private_id), &subscriber, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(&format!("/api/marketplace/{}/subscribe", public_id), &author, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Someone else's key cannot be attached
    let (_, author_key) = app.create_api_key(&author, "AUTHORKEY1234").await;
    let (status, _) = app
        .post(
            &format!("/api/marketplace/{}/subscribe", public_id),
            &subscriber,
            json!({ "api_key_id": author_key["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelled_subscriptions_stay_cancelled_and_free_the_key() {
    let app = TestApp::new().await;
    let (author, _) = app.register("Asha", "asha@example.com").await;
    let strategy_id = app.create_strategy(&author, "public edge").await;
    app.put(
        &format!("/api/strategies/{}/visibility", strategy_id),
        &author,
        json!({ "is_public": true }),
    )
    .await;

    let (subscriber, _) = app.register("Ravi", "ravi@example.com").await;
    let (_, key) = app.create_api_key(&subscriber, "RAVIKEY12345").await;
    let key_id = key["id"].as_i64().unwrap();
    let (status, subscription) = app
        .post(
            &format!("/api/marketplace/{}/subscribe", strategy_id),
            &subscriber,
            json!({ "api_key_id": key_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let subscription_id = subscription["id"].as_i64().unwrap();

    let (status, _) = app.delete(&format!("/api/api-keys/{}", key_id), &subscriber).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cancelled) = app
        .delete(&format!("/api/subscriptions/{}", subscription_id), &subscriber)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert!(cancelled["cancelled_at"].is_string());

    let (status, _) = app
        .delete(&format!("/api/subscriptions/{}", subscription_id), &subscriber)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/api-keys/{}", key_id), &subscriber).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_a_strategy_cancels_its_subscriptions() {
    let app = TestApp::new().await;
    let (author, _) = app.register("Asha", "asha@example.com").await;
    let strategy_id = app.create_strategy(&author, "short lived").await;
    app.put(
        &format!("/api/strategies/{}/visibility", strategy_id),
        &author,
        json!({ "is_public": true }),
    )
    .await;
    let (subscriber, _) = app.register("Ravi", "ravi@example.com").await;
    app.post(&format!("/api/marketplace/{}/subscribe", strategy_id), &subscriber, json!({}))
        .await;

    let (status, _) = app.delete(&format!("/api/strategies/{}", strategy_id), &author).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, subs) = app.get("/api/subscriptions", &subscriber).await;
    let subs = subs.as_array().unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["status"], "cancelled");
    assert!(subs[0]["strategy_name"].is_null());
}

#[tokio::test]
async fn wallet_transactions_are_paginated_and_clamped() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (token, user_id) = app.register("Asha", "asha@example.com").await;
    for amount in ["1", "2", "3"] {
        app.fund(&admin, user_id, amount).await;
    }

    let (status, page) = app.get("/api/wallet/transactions?limit=500", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["limit"], 100);
    assert_eq!(page["total"], 3);
    assert_eq!(page["transactions"].as_array().unwrap().len(), 3);

    let (_, page) = app.get("/api/wallet/transactions?limit=0", &token).await;
    assert_eq!(page["limit"], 1);
    assert_eq!(page["transactions"].as_array().unwrap().len(), 1);

    // Newest first, so offset 1 skips the latest top-up
    let (_, page) = app.get("/api/wallet/transactions?limit=1&offset=1", &token).await;
    assert_eq!(page["offset"], 1);
    assert_eq!(decimal(&page["transactions"][0]["amount"]), dec!(2));

    let (_, page) = app.get("/api/wallet/transactions?offset=10", &token).await;
    assert_eq!(page["limit"], 20);
    assert!(page["transactions"].as_array().unwrap().is_empty());
    assert_eq!(page["total"], 3);
}
