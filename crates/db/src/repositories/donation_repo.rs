//! Repository for the `donations` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::donation::{CreateDonation, Donation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, project_id, donor_name, donor_email, amount_cents, \
                        currency, message, certificate_id, created_at";

/// Provides CRUD operations for donations.
pub struct DonationRepo;

impl DonationRepo {
    /// Insert a new donation, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateDonation) -> Result<Donation, sqlx::Error> {
        let query = format!(
            "INSERT INTO donations (user_id, project_id, donor_name, donor_email, amount_cents, currency, message)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(input.user_id)
            .bind(input.project_id)
            .bind(&input.donor_name)
            .bind(&input.donor_email)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// Find a donation by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations WHERE id = $1");
        sqlx::query_as::<_, Donation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all donations, newest first (admin view).
    pub async fn list(pool: &PgPool) -> Result<Vec<Donation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations ORDER BY created_at DESC");
        sqlx::query_as::<_, Donation>(&query).fetch_all(pool).await
    }

    /// List a user's donations, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Donation>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM donations WHERE user_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Donation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Link the issued certificate to its donation.
    pub async fn set_certificate(
        pool: &PgPool,
        id: DbId,
        certificate_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE donations SET certificate_id = $2 WHERE id = $1")
            .bind(id)
            .bind(certificate_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
