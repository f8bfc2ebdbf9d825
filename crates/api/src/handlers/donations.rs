//! Handlers for the `/donations` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use verdex_core::certificates::generate_serial;
use verdex_core::email;
use verdex_core::error::CoreError;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::certificate::{source_type, Certificate, CreateCertificate};
use verdex_db::models::donation::{CreateDonation, Donation};
use verdex_db::models::project::status as project_status;
use verdex_db::repositories::{CertificateRepo, DonationRepo, ProjectRepo};
use verdex_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Minimum accepted donation, in cents.
const MIN_DONATION_CENTS: i64 = 100;

/// Flat conversion rate for donation certificates: cents per tonne CO2e.
const DONATION_CENTS_PER_TONNE: i64 = 1500;

/// Donation currency. Donations are card-less (invoiced), so a single
/// currency keeps the accounting simple.
const DONATION_CURRENCY: &str = "EUR";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /donations`.
#[derive(Debug, Deserialize)]
pub struct DonationRequest {
    pub project_id: DbId,
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    pub message: Option<String>,
}

/// Response body for a created donation: the row plus its certificate.
#[derive(Debug, serde::Serialize)]
pub struct DonationCreated {
    pub donation: Donation,
    pub certificate: Certificate,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for the donation form. The project must exist and be approved.
fn donation_rules(pool: PgPool) -> FormRules<DonationRequest> {
    FormRules::new()
        .field(
            "donor_name",
            vec![FieldRule::when(
                |d: &DonationRequest| d.donor_name.trim().is_empty(),
                "Name is required",
            )],
        )
        .field(
            "donor_email",
            vec![
                FieldRule::when(
                    |d: &DonationRequest| d.donor_email.trim().is_empty(),
                    "Email is required",
                ),
                FieldRule::when(
                    |d: &DonationRequest| !email::is_valid_format(d.donor_email.trim()),
                    "Email format is invalid",
                ),
            ],
        )
        .field(
            "amount_cents",
            vec![FieldRule::when(
                |d: &DonationRequest| d.amount_cents < MIN_DONATION_CENTS,
                "Minimum donation is 1.00",
            )],
        )
        .field(
            "project_id",
            vec![FieldRule::when_async(
                move |d: &DonationRequest| {
                    let pool = pool.clone();
                    let project_id = d.project_id;
                    async move {
                        ProjectRepo::find_by_id(&pool, project_id)
                            .await
                            .map(|project| {
                                !project.is_some_and(|p| p.status == project_status::APPROVED)
                            })
                            .map_err(|e| CoreError::Internal(e.to_string()))
                    }
                },
                "Project does not exist or is not accepting donations",
            )],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/donations
///
/// Public endpoint; logged-in donors get the donation attached to their
/// account. A retirement certificate is issued immediately and a receipt
/// email sent when SMTP is configured.
pub async fn create(
    State(state): State<AppState>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
    Json(input): Json<DonationRequest>,
) -> AppResult<(StatusCode, Json<DonationCreated>)> {
    let errors = validate_flow(&input, &donation_rules(state.pool.clone())).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user_id = auth_user.as_ref().map(|u| u.user_id);

    let project = ProjectRepo::find_by_id(&state.pool, input.project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: input.project_id,
        }))?;

    let donation = DonationRepo::create(
        &state.pool,
        &CreateDonation {
            user_id,
            project_id: input.project_id,
            donor_name: input.donor_name.trim().to_string(),
            donor_email: input.donor_email.trim().to_lowercase(),
            amount_cents: input.amount_cents,
            currency: DONATION_CURRENCY.to_string(),
            message: input.message.clone(),
        },
    )
    .await?;

    let tonnes = donation.amount_cents as f64 / DONATION_CENTS_PER_TONNE as f64;
    let certificate = CertificateRepo::create(
        &state.pool,
        &CreateCertificate {
            serial: generate_serial(chrono::Datelike::year(&chrono::Utc::now())),
            holder_user_id: user_id,
            holder_name: donation.donor_name.clone(),
            source_type: source_type::DONATION.to_string(),
            source_id: donation.id,
            tonnes_co2e: tonnes,
        },
    )
    .await?;

    DonationRepo::set_certificate(&state.pool, donation.id, certificate.id).await?;

    if let Some(mailer) = state.mailer.clone() {
        let to = donation.donor_email.clone();
        let subject = "[Verdex] Thank you for your donation".to_string();
        let body = format!(
            "Your donation of {:.2} {} supports '{}'.\n\n\
             {:.2} tonnes CO2e will be retired.\n\
             Certificate serial: {}\n",
            donation.amount_cents as f64 / 100.0,
            donation.currency,
            project.name,
            tonnes,
            certificate.serial
        );
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &body).await {
                tracing::warn!(error = %e, "Failed to send donation receipt email");
            }
        });
    }

    state.event_bus.publish(
        PlatformEvent::new("donation.received")
            .with_source("donation", donation.id)
            .with_payload(serde_json::json!({
                "amount_cents": donation.amount_cents,
                "project_id": donation.project_id,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DonationCreated {
            donation,
            certificate,
        }),
    ))
}

/// GET /api/v1/donations (admin)
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<Donation>>> {
    let donations = DonationRepo::list(&state.pool).await?;
    Ok(Json(donations))
}

/// GET /api/v1/donations/mine
pub async fn list_mine(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Donation>>> {
    let donations = DonationRepo::list_by_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(donations))
}

/// GET /api/v1/donations/{id} (admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<Donation>> {
    let donation = DonationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Donation",
            id,
        }))?;
    Ok(Json(donation))
}
