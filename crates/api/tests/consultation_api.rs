//! HTTP-level integration tests for the `/consultations` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get_auth, post_json, post_json_auth, seed_user, token_for};
use serde_json::json;
use sqlx::PgPool;

fn valid_request() -> serde_json::Value {
    json!({
        "name": "Cory Consult",
        "email": "cory@example.com",
        "topic": "Scope 3 offsetting",
        "message": "We would like advice on offsetting our logistics emissions.",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_consultation_request_is_created(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/consultations", valid_request()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["status"], "new");
    assert_eq!(json["topic"], "Scope 3 offsetting");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_short_message_fails_second_rule(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/consultations",
        json!({
            "name": "Cory Consult",
            "email": "cory@example.com",
            "topic": "Pricing",
            "message": "Too short.",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["field"], "message");
    assert_eq!(fields[0]["message"], "Message must be at least 20 characters");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_list_filters_by_status(pool: PgPool) {
    let admin = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;

    let app = build_test_app(pool.clone());
    post_json(app, "/api/v1/consultations", valid_request()).await;

    // Filtered list: everything is `new` right after submission.
    let app = build_test_app(pool.clone());
    let response = get_auth(
        app,
        "/api/v1/consultations?status=new",
        &token_for(admin, "admin"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().expect("array").len(), 1);

    let app = build_test_app(pool.clone());
    let response = get_auth(
        app,
        "/api/v1/consultations?status=closed",
        &token_for(admin, "admin"),
    )
    .await;
    let listed = body_json(response).await;
    assert!(listed.as_array().expect("array").is_empty());

    // Unknown status values are rejected outright.
    let app = build_test_app(pool);
    let response = get_auth(
        app,
        "/api/v1/consultations?status=bogus",
        &token_for(admin, "admin"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_status_transition_and_rbac(pool: PgPool) {
    let admin = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;
    let member = seed_user(&pool, "Mia Member", "mia@example.com", "member").await;

    let app = build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/consultations", valid_request()).await;
    let created = body_json(response).await;
    let id = created["id"].as_i64().expect("id");

    // Members cannot triage.
    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/consultations/{id}/status"),
        json!({"status": "in_progress"}),
        &token_for(member, "member"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins can.
    let app = build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/consultations/{id}/status"),
        json!({"status": "in_progress"}),
        &token_for(admin, "admin"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "in_progress");
}
