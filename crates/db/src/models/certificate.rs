//! Retirement certificate model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// What a certificate was issued for, stored in `certificates.source_type`.
pub mod source_type {
    pub const ORDER: &str = "order";
    pub const DONATION: &str = "donation";
}

/// A certificate row from the `certificates` table.
///
/// Certificates are publicly verifiable by serial; holder display name is
/// the only identifying field exposed on verification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Certificate {
    pub id: DbId,
    /// Public serial, unique (`uq_certificates_serial`).
    pub serial: String,
    pub holder_user_id: Option<DbId>,
    pub holder_name: String,
    pub source_type: String,
    pub source_id: DbId,
    pub tonnes_co2e: f64,
    pub issued_at: Timestamp,
}

/// DTO for issuing a certificate.
#[derive(Debug)]
pub struct CreateCertificate {
    pub serial: String,
    pub holder_user_id: Option<DbId>,
    pub holder_name: String,
    pub source_type: String,
    pub source_id: DbId,
    pub tonnes_co2e: f64,
}
