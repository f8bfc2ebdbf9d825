//! HTTP-level integration tests for `/donations` and certificate
//! verification.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, get_auth, post_json, seed_user, token_for};
use serde_json::json;
use sqlx::PgPool;
use verdex_core::types::DbId;
use verdex_db::models::project::{status, CreateProject};
use verdex_db::repositories::ProjectRepo;

/// Seed a partner with one approved project, returning the project id.
async fn seed_approved_project(pool: &PgPool) -> DbId {
    let owner_id = seed_user(pool, "Pia Partner", "pia@example.com", "partner").await;
    let project = ProjectRepo::create(
        pool,
        owner_id,
        &CreateProject {
            name: "Mangrove Restoration Delta".to_string(),
            description: "Replanting mangroves across the delta region over ten years."
                .to_string(),
            country: "ID".to_string(),
        },
    )
    .await
    .expect("project insert should succeed");

    ProjectRepo::set_review(pool, project.id, status::APPROVED, None)
        .await
        .expect("review update should succeed");

    project.id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_donation_issues_certificate_and_links_it(pool: PgPool) {
    let project_id = seed_approved_project(&pool).await;

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/donations",
        json!({
            "project_id": project_id,
            "donor_name": "Dana Donor",
            "donor_email": "dana@example.com",
            "amount_cents": 3000,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["donation"]["project_id"], project_id);
    assert_eq!(json["donation"]["amount_cents"], 3000);

    let serial = json["certificate"]["serial"].as_str().expect("serial");
    assert!(serial.starts_with("VDX-"));
    // 3000 cents at 1500 cents/tonne.
    assert_eq!(json["certificate"]["tonnes_co2e"], 2.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_donation_field_errors_come_in_declaration_order(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/donations",
        json!({
            "project_id": 999,
            "donor_name": "",
            "donor_email": "",
            "amount_cents": 50,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_FAILED");

    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0]["field"], "donor_name");
    assert_eq!(fields[1]["field"], "donor_email");
    // First failing rule wins: the empty email reports "required", not the
    // format error.
    assert_eq!(fields[1]["message"], "Email is required");
    assert_eq!(fields[2]["field"], "amount_cents");
    assert_eq!(fields[3]["field"], "project_id");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_donation_to_pending_project_is_rejected(pool: PgPool) {
    let owner_id = seed_user(&pool, "Pia Partner", "pia@example.com", "partner").await;
    let project = ProjectRepo::create(
        &pool,
        owner_id,
        &CreateProject {
            name: "Unreviewed Project".to_string(),
            description: "A project that has not been through review yet at all.".to_string(),
            country: "BR".to_string(),
        },
    )
    .await
    .expect("project insert should succeed");

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/donations",
        json!({
            "project_id": project.id,
            "donor_name": "Dana Donor",
            "donor_email": "dana@example.com",
            "amount_cents": 500,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    let fields = json["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["field"], "project_id");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_certificate_verification_is_public(pool: PgPool) {
    let project_id = seed_approved_project(&pool).await;

    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/donations",
        json!({
            "project_id": project_id,
            "donor_name": "Dana Donor",
            "donor_email": "dana@example.com",
            "amount_cents": 1500,
        }),
    )
    .await;
    let created = body_json(response).await;
    let serial = created["certificate"]["serial"].as_str().expect("serial");

    let app = build_test_app(pool);
    let response = get(app, &format!("/api/v1/certificates/verify/{serial}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["serial"], serial);
    assert_eq!(json["holder_name"], "Dana Donor");
    assert_eq!(json["source_type"], "donation");
    // No holder account data in the public payload.
    assert!(json.get("holder_user_id").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_verify_unknown_serial_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/certificates/verify/VDX-2026-NOPE").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_donation_list_requires_admin(pool: PgPool) {
    let member_id = seed_user(&pool, "Mia Member", "mia@example.com", "member").await;
    let admin_id = seed_user(&pool, "Aki Admin", "aki@example.com", "admin").await;

    let app = build_test_app(pool.clone());
    let response = get(app, "/api/v1/donations").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/donations", &token_for(member_id, "member")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = build_test_app(pool);
    let response = get_auth(app, "/api/v1/donations", &token_for(admin_id, "admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
