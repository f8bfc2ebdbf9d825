//! HTTP-level integration tests for the `/auth` endpoints.
//!
//! Uses Axum's `tower::ServiceExt` to send requests directly to the router.
//! Roles are pre-seeded by migrations.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, post_auth, post_json};
use serde_json::json;
use sqlx::PgPool;

fn register_body(email: &str) -> serde_json::Value {
    json!({
        "name": "Ada Marsh",
        "email": email,
        "password": "a-long-enough-password",
    })
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_creates_member_and_returns_tokens(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/register", register_body("ada@example.com")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["access_token"].as_str().is_some());
    assert!(json["refresh_token"].as_str().is_some());
    assert_eq!(json["user"]["email"], "ada@example.com");
    assert_eq!(json["user"]["role"], "member");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_invalid_fields_returns_422_with_field_errors(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({
            "name": "",
            "email": "not-an-email",
            "password": "short",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_FAILED");

    // One error per failing field, in rule declaration order, first failing
    // rule only.
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["field"], "name");
    assert_eq!(fields[1]["field"], "email");
    assert_eq!(fields[1]["message"], "Email format is invalid");
    assert_eq!(fields[2]["field"], "password");
    assert_eq!(fields[2]["message"], "Password must be at least 8 characters");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_duplicate_email_fails_the_async_rule(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/auth/register", register_body("dup@example.com")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/register", register_body("dup@example.com")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["field"], "email");
    assert_eq!(fields[0]["message"], "Email is already registered");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_unknown_referral_code_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({
            "name": "Ada Marsh",
            "email": "ada@example.com",
            "password": "a-long-enough-password",
            "referral_code": "NOSUCHCODE",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields[0]["field"], "referral_code");
    assert_eq!(fields[0]["message"], "Unknown referral code");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_with_wrong_password_returns_401(pool: PgPool) {
    let app = build_test_app(pool.clone());
    post_json(app, "/api/v1/auth/register", register_body("ada@example.com")).await;

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({"email": "ada@example.com", "password": "wrong-password"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_empty_fields_returns_422_in_declaration_order(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({"email": "", "password": ""}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["field"], "email");
    assert_eq!(fields[1]["field"], "password");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_roundtrip_and_refresh_rotation(pool: PgPool) {
    let app = build_test_app(pool.clone());
    post_json(app, "/api/v1/auth/register", register_body("ada@example.com")).await;

    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({"email": "ada@example.com", "password": "a-long-enough-password"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let refresh_token = login["refresh_token"].as_str().expect("refresh token");

    // First refresh succeeds and rotates the token.
    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": refresh_token}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The old refresh token was revoked by rotation.
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": refresh_token}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_revokes_sessions(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let response =
        post_json(app, "/api/v1/auth/register", register_body("ada@example.com")).await;
    let registered = body_json(response).await;
    let access_token = registered["access_token"].as_str().expect("access token");
    let refresh_token = registered["refresh_token"].as_str().expect("refresh token");

    let app = build_test_app(pool.clone());
    let response = post_auth(app, "/api/v1/auth/logout", access_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Refresh no longer works after logout.
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": refresh_token}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
