//! HTTP-level integration tests for the `/news` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json_auth, seed_user, token_for};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_publish_and_fetch_by_slug(pool: PgPool) {
    let admin = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;

    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/news",
        json!({
            "title": "Verdex launches mangrove credits!",
            "body": "Starting today, mangrove restoration credits are available.",
            "is_published": true,
        }),
        &token_for(admin, "admin"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["slug"], "verdex-launches-mangrove-credits");
    assert!(created["published_at"].as_str().is_some());

    let app = build_test_app(pool);
    let response = get(app, "/api/v1/news/verdex-launches-mangrove-credits").await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["title"], "Verdex launches mangrove credits!");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_title_fails_the_slug_rule(pool: PgPool) {
    let admin = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;
    let body = json!({
        "title": "Quarterly impact report",
        "body": "Numbers for the quarter.",
    });

    let app = build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/news", body.clone(), &token_for(admin, "admin")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/news", body, &token_for(admin, "admin")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields[0]["field"], "title");
    assert_eq!(fields[0]["message"], "An article with this title already exists");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_drafts_are_not_public(pool: PgPool) {
    let admin = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;

    let app = build_test_app(pool.clone());
    post_json_auth(
        app,
        "/api/v1/news",
        json!({
            "title": "Unpublished draft",
            "body": "Not ready yet.",
        }),
        &token_for(admin, "admin"),
    )
    .await;

    // The public feed is empty and the slug 404s.
    let app = build_test_app(pool.clone());
    let response = get(app, "/api/v1/news").await;
    let listed = body_json(response).await;
    assert!(listed.as_array().expect("array").is_empty());

    let app = build_test_app(pool);
    let response = get(app, "/api/v1/news/unpublished-draft").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
