//! Integration tests for the admin gate: login token issuance, bearer
//! protection on the order routes, mutations, and login rate limiting.

mod common;

use axum::http::Method;
use common::{response_json, TestApp, ADMIN_PASSWORD};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn seed_paid_order(app: &TestApp, reference: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{reference}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {
                "status": "success",
                "amount": 450000,
                "customer": { "email": "a@b.com" },
                "metadata": {
                    "cart": [{
                        "product_id": 1,
                        "name": "Adire Fabric",
                        "unit_price": 4500,
                        "quantity": 1
                    }]
                }
            }
        })))
        .mount(&app.gateway)
        .await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/verify-payment?reference={reference}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn login_exchanges_the_secret_for_a_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/admin/login",
            Some(json!({ "password": ADMIN_PASSWORD })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 1800);
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/admin/login",
            Some(json!({ "password": "guess" })),
        )
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn order_listing_requires_a_valid_token() {
    let app = TestApp::new().await;
    seed_paid_order(&app, "R1").await;

    // No token: 401, and no order data in the body.
    let response = app.request(Method::GET, "/api/orders", None).await;
    assert_eq!(response.status(), 401);
    let body = response_json(response).await;
    assert!(body.get("reference").is_none());
    assert!(!body.to_string().contains("R1"));

    // Garbage token: still 401.
    let response = app
        .request_with_token(Method::GET, "/api/orders", "not.a.token", None)
        .await;
    assert_eq!(response.status(), 401);

    // Valid token: the seeded order comes back.
    let token = app.admin_token().await;
    let response = app
        .request_with_token(Method::GET, "/api/orders", &token, None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["reference"], "R1");
    assert_eq!(orders[0]["paid"], true);
}

#[tokio::test]
async fn orders_list_newest_first() {
    let app = TestApp::new().await;
    seed_paid_order(&app, "R1").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    seed_paid_order(&app, "R2").await;

    let token = app.admin_token().await;
    let response = app
        .request_with_token(Method::GET, "/api/orders", &token, None)
        .await;
    let body = response_json(response).await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders[0]["reference"], "R2");
    assert_eq!(orders[1]["reference"], "R1");
}

#[tokio::test]
async fn fulfillment_mutation_flips_the_flag() {
    let app = TestApp::new().await;
    seed_paid_order(&app, "R1").await;
    let token = app.admin_token().await;

    let listing = app
        .request_with_token(Method::GET, "/api/orders", &token, None)
        .await;
    let body = response_json(listing).await;
    let id = body[0]["id"].as_str().unwrap().to_string();

    let response = app
        .request_with_token(
            Method::PUT,
            &format!("/api/orders/{id}/fulfill"),
            &token,
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["fulfilled"], true);
}

#[tokio::test]
async fn payment_flag_mutation_requires_token_and_updates() {
    let app = TestApp::new().await;
    seed_paid_order(&app, "R1").await;
    let token = app.admin_token().await;

    let listing = app
        .request_with_token(Method::GET, "/api/orders", &token, None)
        .await;
    let body = response_json(listing).await;
    let id = body[0]["id"].as_str().unwrap().to_string();

    // Unauthenticated mutation is rejected.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/orders/{id}/payment"),
            Some(json!({ "paid": false })),
        )
        .await;
    assert_eq!(response.status(), 401);

    let response = app
        .request_with_token(
            Method::PUT,
            &format!("/api/orders/{id}/payment"),
            &token,
            Some(json!({ "paid": false })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["paid"], false);
}

#[tokio::test]
async fn fulfilling_an_unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request_with_token(
            Method::PUT,
            "/api/orders/00000000-0000-0000-0000-000000000000/fulfill",
            &token,
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn repeated_failed_logins_are_locked_out() {
    let app = TestApp::new().await;

    // The harness sends no ConnectInfo, so every attempt lands in one
    // rate limit bucket.
    let mut last_status = 0;
    for _ in 0..6 {
        let response = app
            .request(
                Method::POST,
                "/api/admin/login",
                Some(json!({ "password": "guess" })),
            )
            .await;
        last_status = response.status().as_u16();
    }
    assert_eq!(last_status, 429);

    // Even the correct password is refused while locked out.
    let response = app
        .request(
            Method::POST,
            "/api/admin/login",
            Some(json!({ "password": ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), 429);
}
