//! Handlers for the `/certificates` resource.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use verdex_core::types::Timestamp;
use verdex_db::models::certificate::Certificate;
use verdex_db::repositories::CertificateRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Public verification payload: no internal ids or holder account data.
#[derive(Debug, Serialize)]
pub struct CertificateVerification {
    pub serial: String,
    pub holder_name: String,
    pub tonnes_co2e: f64,
    pub source_type: String,
    pub issued_at: Timestamp,
}

/// GET /api/v1/certificates/mine
pub async fn list_mine(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Certificate>>> {
    let certificates = CertificateRepo::list_by_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(certificates))
}

/// GET /api/v1/certificates/verify/{serial}
///
/// Public verification by serial, e.g. scanned off a printed certificate.
pub async fn verify(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> AppResult<Json<CertificateVerification>> {
    let certificate = CertificateRepo::find_by_serial(&state.pool, &serial)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No certificate with serial '{serial}'")))?;

    Ok(Json(CertificateVerification {
        serial: certificate.serial,
        holder_name: certificate.holder_name,
        tonnes_co2e: certificate.tonnes_co2e,
        source_type: certificate.source_type,
        issued_at: certificate.issued_at,
    }))
}
