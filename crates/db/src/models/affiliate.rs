//! Affiliate and referral models.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// An affiliate row from the `affiliates` table.
///
/// One row per enrolled user; `referral_code` is unique across the table
/// (`uq_affiliates_referral_code`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Affiliate {
    pub id: DbId,
    pub user_id: DbId,
    pub referral_code: String,
    /// Commission accrued from paid orders of referred users, in cents.
    pub commission_cents: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A referral row from the `referrals` table: one referred registration.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Referral {
    pub id: DbId,
    pub affiliate_id: DbId,
    pub referred_user_id: DbId,
    pub created_at: Timestamp,
}
