//! Handlers for the `/auth` resource (register, login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use verdex_core::email;
use verdex_core::error::CoreError;
use verdex_core::roles::{ROLE_MEMBER, ROLE_PARTNER};
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::repositories::{AffiliateRepo, RoleRepo, SessionRepo, UserRepo};
use verdex_events::PlatformEvent;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

/// Minimum accepted password length.
const MIN_PASSWORD_LENGTH: usize = 8;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Affiliate referral code, recorded when present.
    pub referral_code: Option<String>,
    /// Register as a project partner instead of a regular member.
    pub partner: Option<bool>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by register, login, and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for the registration form.
///
/// The email-taken and referral-code checks hit the database, so the pool is
/// captured by the rule closures.
fn register_rules(pool: PgPool) -> FormRules<RegisterRequest> {
    let email_pool = pool.clone();
    FormRules::new()
        .field(
            "name",
            vec![FieldRule::when(
                |d: &RegisterRequest| d.name.trim().is_empty(),
                "Name is required",
            )],
        )
        .field(
            "email",
            vec![
                FieldRule::when(
                    |d: &RegisterRequest| d.email.trim().is_empty(),
                    "Email is required",
                ),
                FieldRule::when(
                    |d: &RegisterRequest| !email::is_valid_format(d.email.trim()),
                    "Email format is invalid",
                ),
                FieldRule::when_async(
                    move |d: &RegisterRequest| {
                        let pool = email_pool.clone();
                        let email = d.email.trim().to_string();
                        async move {
                            UserRepo::find_by_email(&pool, &email)
                                .await
                                .map(|existing| existing.is_some())
                                .map_err(|e| CoreError::Internal(e.to_string()))
                        }
                    },
                    "Email is already registered",
                ),
            ],
        )
        .field(
            "password",
            vec![
                FieldRule::when(
                    |d: &RegisterRequest| d.password.is_empty(),
                    "Password is required",
                ),
                FieldRule::when(
                    |d: &RegisterRequest| d.password.len() < MIN_PASSWORD_LENGTH,
                    "Password must be at least 8 characters",
                ),
            ],
        )
        .field(
            "referral_code",
            vec![FieldRule::when_async(
                move |d: &RegisterRequest| {
                    let pool = pool.clone();
                    let code = d
                        .referral_code
                        .as_deref()
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string);
                    async move {
                        match code {
                            // Absent codes are fine; the field is optional.
                            None => Ok(false),
                            Some(code) => AffiliateRepo::find_by_code(&pool, &code)
                                .await
                                .map(|affiliate| affiliate.is_none())
                                .map_err(|e| CoreError::Internal(e.to_string())),
                        }
                    }
                },
                "Unknown referral code",
            )],
        )
}

/// Rules for the login form. Credential correctness is checked afterwards.
fn login_rules() -> FormRules<LoginRequest> {
    FormRules::new()
        .field(
            "email",
            vec![FieldRule::when(
                |d: &LoginRequest| d.email.trim().is_empty(),
                "Email is required",
            )],
        )
        .field(
            "password",
            vec![FieldRule::when(
                |d: &LoginRequest| d.password.is_empty(),
                "Password is required",
            )],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account (member or partner) and return tokens. A valid
/// `referral_code` links the new user to the referring affiliate.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let errors = validate_flow(&input, &register_rules(state.pool.clone())).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let role_name = if input.partner.unwrap_or(false) {
        ROLE_PARTNER
    } else {
        ROLE_MEMBER
    };
    let role = RoleRepo::find_by_name(&state.pool, role_name)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{role_name}' is not seeded")))?;

    // Resolve the referring affiliate up front so referred_by lands on the
    // user row itself. The rules already rejected unknown codes.
    let affiliate = match input
        .referral_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(code) => AffiliateRepo::find_by_code(&state.pool, code).await?,
        None => None,
    };

    let user = UserRepo::create(
        &state.pool,
        &verdex_db::models::user::CreateUser {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash,
            role_id: role.id,
            referred_by: affiliate.as_ref().map(|a| a.id),
        },
    )
    .await?;

    if let Some(affiliate) = &affiliate {
        AffiliateRepo::record_referral(&state.pool, affiliate.id, user.id).await?;
    }

    state.event_bus.publish(
        PlatformEvent::new("user.registered")
            .with_source("user", user.id)
            .with_actor(user.id),
    );

    let response =
        create_auth_response(&state, user.id, &user.name, &user.email, role_name).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let errors = validate_flow(&input, &login_rules()).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // 1. Find user by email.
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    // 2. Check if the account is active.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 3. Check if the account is temporarily locked.
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 5. On failure: increment counter, lock if threshold exceeded.
        UserRepo::increment_failed_login(&state.pool, user.id).await?;

        let new_count = user.failed_login_count + 1;
        if new_count >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
        }

        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    // 6. On success: reset failed count, set last_login_at.
    UserRepo::record_successful_login(&state.pool, user.id).await?;

    // 7. Resolve role name for JWT claims.
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    // 8. Generate tokens and create session.
    let response =
        create_auth_response(&state, user.id, &user.name, &user.email, &role_name).await?;

    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Hash the provided refresh token.
    let token_hash = hash_refresh_token(&input.refresh_token);

    // 2. Find matching active session.
    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // 3. Revoke old session (token rotation).
    SessionRepo::revoke(&state.pool, session.id).await?;

    // 4. Find user and resolve role.
    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    // 5. Generate new tokens and create new session.
    let response =
        create_auth_response(&state, user.id, &user.name, &user.email, &role_name).await?;

    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user_id: DbId,
    name: &str,
    email: &str,
    role: &str,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user_id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = verdex_db::models::session::CreateSession {
        user_id,
        refresh_token_hash: refresh_hash,
        expires_at,
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    let expires_in = state.config.jwt.access_token_expiry_mins * 60;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in,
        user: UserInfo {
            id: user_id,
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        },
    })
}
