//! Handlers for the `/affiliates` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use verdex_core::error::CoreError;
use verdex_core::referral::generate_referral_code;
use verdex_core::types::{DbId, Timestamp};
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::affiliate::Affiliate;
use verdex_db::repositories::AffiliateRepo;
use verdex_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Attempts at generating a non-colliding referral code before giving up.
const CODE_ATTEMPTS: usize = 3;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response body for `GET /affiliates/me`.
#[derive(Debug, Serialize)]
pub struct AffiliateStats {
    pub referral_code: String,
    pub referral_count: i64,
    pub commission_cents: i64,
    pub enrolled_at: Timestamp,
}

/// Referred user summary for `GET /affiliates/me/referrals`.
#[derive(Debug, Serialize)]
pub struct ReferralInfo {
    pub referred_user_id: DbId,
    pub joined_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Enrollment has no request body; the only rule is "not already enrolled",
/// checked against the database for the calling user.
fn enroll_rules(pool: PgPool) -> FormRules<AuthUser> {
    FormRules::new().field(
        "user",
        vec![FieldRule::when_async(
            move |d: &AuthUser| {
                let pool = pool.clone();
                let user_id = d.user_id;
                async move {
                    AffiliateRepo::find_by_user(&pool, user_id)
                        .await
                        .map(|existing| existing.is_some())
                        .map_err(|e| CoreError::Internal(e.to_string()))
                }
            },
            "Already enrolled as an affiliate",
        )],
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/affiliates
///
/// Enroll the calling user as an affiliate with a freshly generated
/// referral code. Retries code generation on the (unlikely) unique
/// collision.
pub async fn enroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<(StatusCode, Json<Affiliate>)> {
    let errors = validate_flow(&auth_user, &enroll_rules(state.pool.clone())).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let mut last_err: Option<sqlx::Error> = None;
    for _ in 0..CODE_ATTEMPTS {
        let code = generate_referral_code();
        match AffiliateRepo::create(&state.pool, auth_user.user_id, &code).await {
            Ok(affiliate) => {
                state.event_bus.publish(
                    PlatformEvent::new("affiliate.enrolled")
                        .with_source("affiliate", affiliate.id)
                        .with_actor(auth_user.user_id),
                );
                return Ok((StatusCode::CREATED, Json(affiliate)));
            }
            Err(e) if is_code_collision(&e) => last_err = Some(e),
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::InternalError(format!(
        "Could not generate a unique referral code: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// GET /api/v1/affiliates/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<AffiliateStats>>> {
    let affiliate = find_enrolled(&state, &auth_user).await?;
    let referral_count = AffiliateRepo::count_referrals(&state.pool, affiliate.id).await?;

    Ok(Json(DataResponse {
        data: AffiliateStats {
            referral_code: affiliate.referral_code,
            referral_count,
            commission_cents: affiliate.commission_cents,
            enrolled_at: affiliate.created_at,
        },
    }))
}

/// GET /api/v1/affiliates/me/referrals
pub async fn my_referrals(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ReferralInfo>>>> {
    let affiliate = find_enrolled(&state, &auth_user).await?;
    let referrals = AffiliateRepo::list_referrals(&state.pool, affiliate.id).await?;

    Ok(Json(DataResponse {
        data: referrals
            .into_iter()
            .map(|r| ReferralInfo {
                referred_user_id: r.referred_user_id,
                joined_at: r.created_at,
            })
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the caller's affiliate row or 404.
async fn find_enrolled(state: &AppState, auth_user: &AuthUser) -> AppResult<Affiliate> {
    AffiliateRepo::find_by_user(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Affiliate",
            id: auth_user.user_id,
        }))
}

/// Whether a sqlx error is the referral-code unique violation.
fn is_code_collision(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_affiliates_referral_code")
    )
}
