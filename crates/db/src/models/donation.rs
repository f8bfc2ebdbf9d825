//! Donation model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// A donation row from the `donations` table.
///
/// Donations may be anonymous (no `user_id`); the donor's email is always
/// captured for the receipt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Donation {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub project_id: DbId,
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub message: Option<String>,
    /// Certificate issued for this donation, set after issuance.
    pub certificate_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for persisting a validated donation.
#[derive(Debug)]
pub struct CreateDonation {
    pub user_id: Option<DbId>,
    pub project_id: DbId,
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub message: Option<String>,
}
