//! Handlers for the `/consultations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use verdex_core::email;
use verdex_core::error::CoreError;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::consultation::{status, Consultation, CreateConsultation};
use verdex_db::repositories::ConsultationRepo;
use verdex_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Minimum accepted consultation message length.
const MIN_MESSAGE_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /consultations`.
#[derive(Debug, Deserialize)]
pub struct ConsultationRequest {
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
}

/// Query parameters for `GET /consultations` (admin).
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Request body for `POST /consultations/{id}/status` (admin).
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for the public consultation form. All checks are synchronous.
fn consultation_rules() -> FormRules<ConsultationRequest> {
    FormRules::new()
        .field(
            "name",
            vec![FieldRule::when(
                |d: &ConsultationRequest| d.name.trim().is_empty(),
                "Name is required",
            )],
        )
        .field(
            "email",
            vec![
                FieldRule::when(
                    |d: &ConsultationRequest| d.email.trim().is_empty(),
                    "Email is required",
                ),
                FieldRule::when(
                    |d: &ConsultationRequest| !email::is_valid_format(d.email.trim()),
                    "Email format is invalid",
                ),
            ],
        )
        .field(
            "topic",
            vec![FieldRule::when(
                |d: &ConsultationRequest| d.topic.trim().is_empty(),
                "Topic is required",
            )],
        )
        .field(
            "message",
            vec![
                FieldRule::when(
                    |d: &ConsultationRequest| d.message.trim().is_empty(),
                    "Message is required",
                ),
                FieldRule::when(
                    |d: &ConsultationRequest| d.message.trim().len() < MIN_MESSAGE_LENGTH,
                    "Message must be at least 20 characters",
                ),
            ],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/consultations
///
/// Public endpoint. Persists the request and notifies the staff inbox when
/// one is configured.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ConsultationRequest>,
) -> AppResult<(StatusCode, Json<Consultation>)> {
    let errors = validate_flow(&input, &consultation_rules()).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let consultation = ConsultationRepo::create(
        &state.pool,
        &CreateConsultation {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            topic: input.topic.trim().to_string(),
            message: input.message.trim().to_string(),
        },
    )
    .await?;

    if let Some(mailer) = state.mailer.clone() {
        if let Some(staff) = mailer.staff_address().map(str::to_string) {
            let subject = format!("[Verdex] Consultation request: {}", consultation.topic);
            let body = format!(
                "From: {} <{}>\n\n{}\n",
                consultation.name, consultation.email, consultation.message
            );
            tokio::spawn(async move {
                if let Err(e) = mailer.send(&staff, &subject, &body).await {
                    tracing::warn!(error = %e, "Failed to send consultation notification");
                }
            });
        }
    }

    state.event_bus.publish(
        PlatformEvent::new("consultation.requested")
            .with_source("consultation", consultation.id),
    );

    Ok((StatusCode::CREATED, Json(consultation)))
}

/// GET /api/v1/consultations (admin)
///
/// Optionally filtered by `?status=new|in_progress|closed`.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Consultation>>> {
    if let Some(status) = &query.status {
        if !is_known_status(status) {
            return Err(AppError::BadRequest(format!(
                "Unknown consultation status '{status}'"
            )));
        }
    }

    let consultations = ConsultationRepo::list(&state.pool, query.status.as_deref()).await?;
    Ok(Json(consultations))
}

/// POST /api/v1/consultations/{id}/status (admin)
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<Json<Consultation>> {
    if !is_known_status(&input.status) {
        return Err(AppError::BadRequest(format!(
            "Unknown consultation status '{}'",
            input.status
        )));
    }

    let consultation = ConsultationRepo::set_status(&state.pool, id, &input.status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Consultation",
            id,
        }))?;
    Ok(Json(consultation))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_known_status(candidate: &str) -> bool {
    matches!(
        candidate,
        status::NEW | status::IN_PROGRESS | status::CLOSED
    )
}
