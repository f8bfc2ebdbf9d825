//! Repository for the `affiliates` and `referrals` tables.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::affiliate::{Affiliate, Referral};

/// Column list shared across affiliate queries.
const COLUMNS: &str = "id, user_id, referral_code, commission_cents, created_at, updated_at";

/// Column list shared across referral queries.
const REFERRAL_COLUMNS: &str = "id, affiliate_id, referred_user_id, created_at";

/// Provides operations for affiliate enrollment and referral tracking.
pub struct AffiliateRepo;

impl AffiliateRepo {
    /// Enroll a user as an affiliate with the given referral code.
    ///
    /// Fails with a unique violation (`uq_affiliates_referral_code`) on a
    /// code collision; callers regenerate and retry.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        referral_code: &str,
    ) -> Result<Affiliate, sqlx::Error> {
        let query = format!(
            "INSERT INTO affiliates (user_id, referral_code)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Affiliate>(&query)
            .bind(user_id)
            .bind(referral_code)
            .fetch_one(pool)
            .await
    }

    /// Find an affiliate by the enrolled user.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Affiliate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM affiliates WHERE user_id = $1");
        sqlx::query_as::<_, Affiliate>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an affiliate by referral code (exact match).
    pub async fn find_by_code(
        pool: &PgPool,
        referral_code: &str,
    ) -> Result<Option<Affiliate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM affiliates WHERE referral_code = $1");
        sqlx::query_as::<_, Affiliate>(&query)
            .bind(referral_code)
            .fetch_optional(pool)
            .await
    }

    /// Record that `referred_user_id` registered through this affiliate.
    pub async fn record_referral(
        pool: &PgPool,
        affiliate_id: DbId,
        referred_user_id: DbId,
    ) -> Result<Referral, sqlx::Error> {
        let query = format!(
            "INSERT INTO referrals (affiliate_id, referred_user_id)
             VALUES ($1, $2)
             RETURNING {REFERRAL_COLUMNS}"
        );
        sqlx::query_as::<_, Referral>(&query)
            .bind(affiliate_id)
            .bind(referred_user_id)
            .fetch_one(pool)
            .await
    }

    /// List an affiliate's referrals, newest first.
    pub async fn list_referrals(
        pool: &PgPool,
        affiliate_id: DbId,
    ) -> Result<Vec<Referral>, sqlx::Error> {
        let query = format!(
            "SELECT {REFERRAL_COLUMNS} FROM referrals
             WHERE affiliate_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Referral>(&query)
            .bind(affiliate_id)
            .fetch_all(pool)
            .await
    }

    /// Count an affiliate's referrals.
    pub async fn count_referrals(pool: &PgPool, affiliate_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM referrals WHERE affiliate_id = $1")
                .bind(affiliate_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Accrue commission (in cents) from a paid order of a referred user.
    pub async fn add_commission(
        pool: &PgPool,
        affiliate_id: DbId,
        amount_cents: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE affiliates SET commission_cents = commission_cents + $2 WHERE id = $1",
        )
        .bind(affiliate_id)
        .bind(amount_cents)
        .execute(pool)
        .await?;
        Ok(())
    }
}
