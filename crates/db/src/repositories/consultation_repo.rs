//! Repository for the `consultations` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::consultation::{Consultation, CreateConsultation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, topic, message, status, created_at, updated_at";

/// Provides CRUD operations for consultation requests.
pub struct ConsultationRepo;

impl ConsultationRepo {
    /// Insert a new consultation request in `new` state.
    pub async fn create(
        pool: &PgPool,
        input: &CreateConsultation,
    ) -> Result<Consultation, sqlx::Error> {
        let query = format!(
            "INSERT INTO consultations (name, email, topic, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Consultation>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.topic)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// Find a consultation by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Consultation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM consultations WHERE id = $1");
        sqlx::query_as::<_, Consultation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List consultations, optionally filtered by status, newest first.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
    ) -> Result<Vec<Consultation>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM consultations WHERE status = $1 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Consultation>(&query)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query =
                    format!("SELECT {COLUMNS} FROM consultations ORDER BY created_at DESC");
                sqlx::query_as::<_, Consultation>(&query).fetch_all(pool).await
            }
        }
    }

    /// Set a consultation's triage status.
    ///
    /// Returns the updated row, or `None` if no row with the given `id` exists.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Consultation>, sqlx::Error> {
        let query = format!(
            "UPDATE consultations SET status = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Consultation>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
