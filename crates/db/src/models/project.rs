//! Carbon offset project model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// Project review states stored in `projects.status`.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    /// The partner user that registered the project.
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub status: String,
    /// Reviewer note set on approval/rejection.
    pub review_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

/// DTO for registering a new project.
#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub country: String,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
}
