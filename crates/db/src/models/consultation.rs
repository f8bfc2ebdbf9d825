//! Consultation request model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// Consultation triage states stored in `consultations.status`.
pub mod status {
    pub const NEW: &str = "new";
    pub const IN_PROGRESS: &str = "in_progress";
    pub const CLOSED: &str = "closed";
}

/// A consultation request row from the `consultations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Consultation {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for persisting a validated consultation request.
#[derive(Debug)]
pub struct CreateConsultation {
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
}
