//! Project carbon registration models and DTOs.
//!
//! A carbon registration declares a vintage of credits for a project,
//! backed by one or more uploaded supporting documents.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// Registration review states stored in `carbon_registrations.status`.
pub mod status {
    pub const SUBMITTED: &str = "submitted";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

/// A carbon registration row from the `carbon_registrations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CarbonRegistration {
    pub id: DbId,
    pub project_id: DbId,
    /// Year the credited reductions occurred.
    pub vintage_year: i32,
    pub tonnes_co2e: f64,
    /// Crediting methodology identifier (e.g. `"VM0042"`).
    pub methodology: String,
    pub status: String,
    pub review_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a carbon registration.
#[derive(Debug)]
pub struct CreateCarbonRegistration {
    pub project_id: DbId,
    pub vintage_year: i32,
    pub tonnes_co2e: f64,
    pub methodology: String,
}

/// An uploaded supporting document row from `registration_documents`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegistrationDocument {
    pub id: DbId,
    pub registration_id: DbId,
    /// Original client-side file name.
    pub file_name: String,
    /// Server-side storage path.
    pub file_path: String,
    pub file_size_bytes: i64,
    pub content_type: String,
    pub created_at: Timestamp,
}

/// DTO for recording a stored document.
#[derive(Debug)]
pub struct CreateRegistrationDocument {
    pub registration_id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub content_type: String,
}
