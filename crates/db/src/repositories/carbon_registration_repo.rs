//! Repository for the `carbon_registrations` and `registration_documents` tables.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::carbon_registration::{
    status, CarbonRegistration, CreateCarbonRegistration, CreateRegistrationDocument,
    RegistrationDocument,
};

/// Column list shared across registration queries.
const COLUMNS: &str = "id, project_id, vintage_year, tonnes_co2e, methodology, status, \
                        review_note, created_at, updated_at";

/// Column list shared across document queries.
const DOC_COLUMNS: &str =
    "id, registration_id, file_name, file_path, file_size_bytes, content_type, created_at";

/// Provides CRUD operations for carbon registrations and their documents.
pub struct CarbonRegistrationRepo;

impl CarbonRegistrationRepo {
    /// Insert a new registration in `submitted` state, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCarbonRegistration,
    ) -> Result<CarbonRegistration, sqlx::Error> {
        let query = format!(
            "INSERT INTO carbon_registrations (project_id, vintage_year, tonnes_co2e, methodology, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CarbonRegistration>(&query)
            .bind(input.project_id)
            .bind(input.vintage_year)
            .bind(input.tonnes_co2e)
            .bind(&input.methodology)
            .bind(status::SUBMITTED)
            .fetch_one(pool)
            .await
    }

    /// Find a registration by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CarbonRegistration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM carbon_registrations WHERE id = $1");
        sqlx::query_as::<_, CarbonRegistration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's registrations, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<CarbonRegistration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM carbon_registrations
             WHERE project_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, CarbonRegistration>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Set the review outcome (`approved`/`rejected`) and note.
    ///
    /// Returns the updated row, or `None` if no row with the given `id` exists.
    pub async fn set_review(
        pool: &PgPool,
        id: DbId,
        status: &str,
        review_note: Option<&str>,
    ) -> Result<Option<CarbonRegistration>, sqlx::Error> {
        let query = format!(
            "UPDATE carbon_registrations SET status = $2, review_note = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CarbonRegistration>(&query)
            .bind(id)
            .bind(status)
            .bind(review_note)
            .fetch_optional(pool)
            .await
    }

    /// Record a stored document for a registration.
    pub async fn add_document(
        pool: &PgPool,
        input: &CreateRegistrationDocument,
    ) -> Result<RegistrationDocument, sqlx::Error> {
        let query = format!(
            "INSERT INTO registration_documents (registration_id, file_name, file_path, file_size_bytes, content_type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {DOC_COLUMNS}"
        );
        sqlx::query_as::<_, RegistrationDocument>(&query)
            .bind(input.registration_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(input.file_size_bytes)
            .bind(&input.content_type)
            .fetch_one(pool)
            .await
    }

    /// List a registration's documents in upload order.
    pub async fn list_documents(
        pool: &PgPool,
        registration_id: DbId,
    ) -> Result<Vec<RegistrationDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {DOC_COLUMNS} FROM registration_documents
             WHERE registration_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RegistrationDocument>(&query)
            .bind(registration_id)
            .fetch_all(pool)
            .await
    }
}
