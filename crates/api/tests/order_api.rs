//! HTTP-level integration tests for `/orders` and the payment webhook.
//!
//! The test payment client points at an unroutable address, so checkout
//! creation fails with 502; the webhook flow is driven by inserting an
//! order row directly and signing the callback body with the shared test
//! secret.

mod common;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use common::{
    body_json, build_test_app, get_auth, post_json_auth, seed_user, token_for,
    TEST_WEBHOOK_SECRET,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use verdex_core::types::DbId;
use verdex_db::models::order::{status, CreateOrder};
use verdex_db::models::product::CreateProduct;
use verdex_db::repositories::{AffiliateRepo, CertificateRepo, OrderRepo, ProductRepo};
use verdex_payment::webhook;

async fn seed_product(pool: &PgPool, stock_units: i32) -> DbId {
    ProductRepo::create(
        pool,
        &CreateProduct {
            name: "Reforestation credit".to_string(),
            description: None,
            price_cents: 1200,
            currency: None,
            unit_tonnes_co2e: 1.0,
            stock_units,
        },
    )
    .await
    .expect("product insert should succeed")
    .id
}

/// Insert a pending order directly, as if checkout creation had succeeded.
async fn seed_pending_order(
    pool: &PgPool,
    user_id: DbId,
    product_id: DbId,
    provider_ref: &str,
) -> DbId {
    OrderRepo::create(
        pool,
        &CreateOrder {
            user_id,
            product_id,
            quantity: 2,
            amount_cents: 2400,
            currency: "EUR".to_string(),
            provider_ref: provider_ref.to_string(),
            payment_url: format!("https://pay.example.com/c/{provider_ref}"),
        },
    )
    .await
    .expect("order insert should succeed")
    .id
}

/// POST a signed payment webhook callback.
async fn post_webhook(app: axum::Router, body: &serde_json::Value) -> axum::response::Response {
    let raw = body.to_string();
    let signature = webhook::sign(TEST_WEBHOOK_SECRET, raw.as_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/orders/webhooks/payment")
        .header(CONTENT_TYPE, "application/json")
        .header("x-payment-signature", signature)
        .body(Body::from(raw))
        .expect("request should build");
    app.oneshot(request).await.expect("request should not error")
}

// ---------------------------------------------------------------------------
// Order placement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_order_for_unknown_product_fails_validation(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;

    let app = build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/orders",
        json!({"product_id": 999, "quantity": 1}),
        &token_for(buyer, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields[0]["field"], "product_id");
    assert_eq!(fields[0]["message"], "Product is not available");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_order_beyond_stock_fails_validation(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;
    let product_id = seed_product(&pool, 3).await;

    let app = build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/orders",
        json!({"product_id": product_id, "quantity": 5}),
        &token_for(buyer, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields[0]["field"], "quantity");
    assert_eq!(
        fields[0]["message"],
        "Not enough stock for the requested quantity"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_gateway_failure_returns_502_and_releases_stock(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;
    let product_id = seed_product(&pool, 3).await;

    // The test payment client points at an unroutable address.
    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/orders",
        json!({"product_id": product_id, "quantity": 2}),
        &token_for(buyer, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "PAYMENT_UPSTREAM");

    // Reserved stock was returned; no order row was written.
    let product = ProductRepo::find_by_id(&pool, product_id)
        .await
        .expect("product lookup should succeed")
        .expect("product should exist");
    assert_eq!(product.stock_units, 3);

    let orders = OrderRepo::list_by_user(&pool, buyer)
        .await
        .expect("order list should succeed");
    assert!(orders.is_empty());
}

// ---------------------------------------------------------------------------
// Payment webhook
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unsigned_webhook_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/orders/webhooks/payment")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"provider_ref":"chk_1","status":"paid"}"#))
        .expect("request should build");
    let response = app.oneshot(request).await.expect("request should not error");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_paid_webhook_settles_order_and_issues_certificate(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;
    let product_id = seed_product(&pool, 5).await;
    let order_id = seed_pending_order(&pool, buyer, product_id, "chk_settle").await;

    let app = build_test_app(pool.clone());
    let response = post_webhook(
        app,
        &json!({"provider_ref": "chk_settle", "status": "paid"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = OrderRepo::find_by_id(&pool, order_id)
        .await
        .expect("order lookup should succeed")
        .expect("order should exist");
    assert_eq!(order.status, status::PAID);

    // A retirement certificate for 2 units of 1 tCO2e each.
    let certificates = CertificateRepo::list_by_user(&pool, buyer)
        .await
        .expect("certificate list should succeed");
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].tonnes_co2e, 2.0);
    assert_eq!(certificates[0].source_type, "order");

    // A duplicate delivery is acknowledged without double fulfillment.
    let app = build_test_app(pool.clone());
    let response = post_webhook(
        app,
        &json!({"provider_ref": "chk_settle", "status": "paid"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let certificates = CertificateRepo::list_by_user(&pool, buyer)
        .await
        .expect("certificate list should succeed");
    assert_eq!(certificates.len(), 1, "no second certificate on retry");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_paid_webhook_accrues_commission_for_referred_buyer(pool: PgPool) {
    // Affiliate enrolls, then a referred buyer registers through their code.
    let affiliate_user = seed_user(&pool, "Afi Affiliate", "afi@example.com", "member").await;
    let affiliate = AffiliateRepo::create(&pool, affiliate_user, "TESTCODE")
        .await
        .expect("affiliate insert should succeed");

    let buyer = seed_user(&pool, "Ref Buyer", "ref@example.com", "member").await;
    sqlx::query("UPDATE users SET referred_by = $2 WHERE id = $1")
        .bind(buyer)
        .bind(affiliate.id)
        .execute(&pool)
        .await
        .expect("referred_by update should succeed");

    let product_id = seed_product(&pool, 5).await;
    seed_pending_order(&pool, buyer, product_id, "chk_ref").await;

    let app = build_test_app(pool.clone());
    let response = post_webhook(app, &json!({"provider_ref": "chk_ref", "status": "paid"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // 5% of 2400 cents.
    let updated = AffiliateRepo::find_by_user(&pool, affiliate_user)
        .await
        .expect("affiliate lookup should succeed")
        .expect("affiliate should exist");
    assert_eq!(updated.commission_cents, 120);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_failed_webhook_releases_stock(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;
    let product_id = seed_product(&pool, 5).await;

    // Simulate the reservation that order placement performs.
    ProductRepo::reserve_stock(&pool, product_id, 2)
        .await
        .expect("stock reservation should succeed");
    seed_pending_order(&pool, buyer, product_id, "chk_fail").await;

    let app = build_test_app(pool.clone());
    let response = post_webhook(app, &json!({"provider_ref": "chk_fail", "status": "failed"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let product = ProductRepo::find_by_id(&pool, product_id)
        .await
        .expect("product lookup should succeed")
        .expect("product should exist");
    assert_eq!(product.stock_units, 5, "failed payment returns stock");
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_orders_are_hidden_from_other_users(pool: PgPool) {
    let buyer = seed_user(&pool, "Bo Buyer", "bo@example.com", "member").await;
    let other = seed_user(&pool, "Oz Other", "oz@example.com", "member").await;
    let product_id = seed_product(&pool, 5).await;
    let order_id = seed_pending_order(&pool, buyer, product_id, "chk_priv").await;

    let app = build_test_app(pool.clone());
    let response = get_auth(
        app,
        &format!("/api/v1/orders/{order_id}"),
        &token_for(other, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/orders/{order_id}"),
        &token_for(buyer, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
