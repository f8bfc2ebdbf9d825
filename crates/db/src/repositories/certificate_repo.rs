//! Repository for the `certificates` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::certificate::{Certificate, CreateCertificate};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, serial, holder_user_id, holder_name, source_type, source_id, tonnes_co2e, issued_at";

/// Provides operations for issued certificates.
pub struct CertificateRepo;

impl CertificateRepo {
    /// Issue a certificate, returning the created row.
    ///
    /// Fails with a unique violation (`uq_certificates_serial`) on a serial
    /// collision; callers regenerate and retry.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCertificate,
    ) -> Result<Certificate, sqlx::Error> {
        let query = format!(
            "INSERT INTO certificates (serial, holder_user_id, holder_name, source_type, source_id, tonnes_co2e)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Certificate>(&query)
            .bind(&input.serial)
            .bind(input.holder_user_id)
            .bind(&input.holder_name)
            .bind(&input.source_type)
            .bind(input.source_id)
            .bind(input.tonnes_co2e)
            .fetch_one(pool)
            .await
    }

    /// Find a certificate by its public serial.
    pub async fn find_by_serial(
        pool: &PgPool,
        serial: &str,
    ) -> Result<Option<Certificate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM certificates WHERE serial = $1");
        sqlx::query_as::<_, Certificate>(&query)
            .bind(serial)
            .fetch_optional(pool)
            .await
    }

    /// List a user's certificates, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Certificate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM certificates
             WHERE holder_user_id = $1
             ORDER BY issued_at DESC"
        );
        sqlx::query_as::<_, Certificate>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
