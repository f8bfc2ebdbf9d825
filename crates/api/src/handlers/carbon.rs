//! Handlers for project carbon registrations:
//! `/projects/{project_id}/carbon[/{id}]`.
//!
//! Registration is a multipart form: metadata fields plus one or more
//! `document` file parts. Metadata runs through the rule engine before any
//! file is written to disk.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdex_core::error::CoreError;
use verdex_core::roles::ROLE_ADMIN;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::carbon_registration::{
    status, CarbonRegistration, CreateCarbonRegistration, CreateRegistrationDocument,
    RegistrationDocument,
};
use verdex_db::repositories::{CarbonRegistrationRepo, ProjectRepo, UserRepo};
use verdex_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequirePartner};
use crate::state::AppState;

/// Supported document extensions for registration uploads.
const SUPPORTED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// Per-file size cap for uploaded documents.
const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Earliest plausible vintage year.
const MIN_VINTAGE_YEAR: i32 = 2000;

// ---------------------------------------------------------------------------
// Form shape
// ---------------------------------------------------------------------------

/// Collected multipart metadata, before rule validation.
///
/// Numeric fields stay `Option` so that a missing or unparsable value fails
/// the "required" rule instead of panicking in the handler.
#[derive(Debug, Default)]
struct RegistrationForm {
    vintage_year: Option<i32>,
    tonnes_co2e: Option<f64>,
    methodology: String,
    document_count: usize,
}

/// One uploaded file, held in memory until the metadata validates.
struct UploadedDocument {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Request body for `POST /projects/{project_id}/carbon/{id}/review` (admin).
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub approve: bool,
    pub note: Option<String>,
}

/// Registration plus its uploaded documents.
#[derive(Debug, Serialize)]
pub struct RegistrationDetail {
    pub registration: CarbonRegistration,
    pub documents: Vec<RegistrationDocument>,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for registration metadata. All checks are synchronous; project
/// ownership is enforced before parsing the form.
fn registration_rules() -> FormRules<RegistrationForm> {
    let max_year = chrono::Utc::now().year() + 1;
    FormRules::new()
        .field(
            "vintage_year",
            vec![
                FieldRule::when(
                    |d: &RegistrationForm| d.vintage_year.is_none(),
                    "Vintage year is required",
                ),
                FieldRule::when(
                    move |d: &RegistrationForm| {
                        d.vintage_year
                            .is_some_and(|y| y < MIN_VINTAGE_YEAR || y > max_year)
                    },
                    "Vintage year is out of range",
                ),
            ],
        )
        .field(
            "tonnes_co2e",
            vec![
                FieldRule::when(
                    |d: &RegistrationForm| d.tonnes_co2e.is_none(),
                    "Tonnes CO2e is required",
                ),
                FieldRule::when(
                    |d: &RegistrationForm| d.tonnes_co2e.is_some_and(|t| t <= 0.0),
                    "Tonnes CO2e must be positive",
                ),
            ],
        )
        .field(
            "methodology",
            vec![FieldRule::when(
                |d: &RegistrationForm| d.methodology.trim().is_empty(),
                "Methodology is required",
            )],
        )
        .field(
            "document",
            vec![FieldRule::when(
                |d: &RegistrationForm| d.document_count == 0,
                "At least one supporting document is required",
            )],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{project_id}/carbon (owner)
///
/// Multipart form: `vintage_year`, `tonnes_co2e`, `methodology`, and one or
/// more `document` file parts. Files are written under the configured
/// upload directory only after the metadata passes validation.
pub async fn create(
    State(state): State<AppState>,
    RequirePartner(user): RequirePartner,
    Path(project_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<RegistrationDetail>)> {
    let project = find_owned_project(&state, &user, project_id).await?;

    let mut form = RegistrationForm::default();
    let mut documents: Vec<UploadedDocument> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "vintage_year" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.vintage_year = text.trim().parse().ok();
            }
            "tonnes_co2e" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.tonnes_co2e = text.trim().parse().ok();
            }
            "methodology" => {
                form.methodology = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "document" => {
                let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                let ext = file_name.rsplit('.').next().unwrap_or("").to_lowercase();
                if !SUPPORTED_DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
                    return Err(AppError::BadRequest(format!(
                        "Unsupported document format '.{ext}'. Supported: .pdf, .png, .jpg, .jpeg"
                    )));
                }
                if data.len() > MAX_DOCUMENT_BYTES {
                    return Err(AppError::BadRequest(format!(
                        "Document '{file_name}' exceeds the 10 MB limit"
                    )));
                }

                documents.push(UploadedDocument {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {} // ignore unknown fields
        }
    }
    form.document_count = documents.len();

    let errors = validate_flow(&form, &registration_rules()).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // Validated above: both fields fail their "required" rule when None.
    let vintage_year = form.vintage_year.unwrap_or_default();
    let tonnes_co2e = form.tonnes_co2e.unwrap_or_default();

    let registration = CarbonRegistrationRepo::create(
        &state.pool,
        &CreateCarbonRegistration {
            project_id: project.id,
            vintage_year,
            tonnes_co2e,
            methodology: form.methodology.trim().to_string(),
        },
    )
    .await?;

    let mut stored = Vec::with_capacity(documents.len());
    let upload_dir = std::path::PathBuf::from(&state.config.upload_dir);
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    for document in &documents {
        let ext = document
            .file_name
            .rsplit('.')
            .next()
            .unwrap_or("bin")
            .to_lowercase();
        let stored_name = format!("reg_{}_{}.{ext}", registration.id, Uuid::new_v4());
        let file_path = upload_dir.join(&stored_name);
        tokio::fs::write(&file_path, &document.data)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let row = CarbonRegistrationRepo::add_document(
            &state.pool,
            &CreateRegistrationDocument {
                registration_id: registration.id,
                file_name: document.file_name.clone(),
                file_path: file_path.to_string_lossy().to_string(),
                file_size_bytes: document.data.len() as i64,
                content_type: document.content_type.clone(),
            },
        )
        .await?;
        stored.push(row);
    }

    state.event_bus.publish(
        PlatformEvent::new("carbon_registration.submitted")
            .with_source("carbon_registration", registration.id)
            .with_actor(user.user_id),
    );

    Ok((
        StatusCode::CREATED,
        Json(RegistrationDetail {
            registration,
            documents: stored,
        }),
    ))
}

/// GET /api/v1/projects/{project_id}/carbon (owner or admin)
pub async fn list_by_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<Vec<CarbonRegistration>>> {
    find_owned_project(&state, &auth_user, project_id).await?;
    let registrations = CarbonRegistrationRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(registrations))
}

/// GET /api/v1/projects/{project_id}/carbon/{id} (owner or admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<RegistrationDetail>> {
    find_owned_project(&state, &auth_user, project_id).await?;

    let registration = CarbonRegistrationRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|r| r.project_id == project_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CarbonRegistration",
            id,
        }))?;
    let documents = CarbonRegistrationRepo::list_documents(&state.pool, id).await?;

    Ok(Json(RegistrationDetail {
        registration,
        documents,
    }))
}

/// POST /api/v1/projects/{project_id}/carbon/{id}/review (admin)
pub async fn review(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((project_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<CarbonRegistration>> {
    let new_status = if input.approve {
        status::APPROVED
    } else {
        status::REJECTED
    };

    let registration = CarbonRegistrationRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|r| r.project_id == project_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CarbonRegistration",
            id,
        }))?;

    let registration =
        CarbonRegistrationRepo::set_review(&state.pool, registration.id, new_status, input.note.as_deref())
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "CarbonRegistration",
                id,
            }))?;

    state.event_bus.publish(
        PlatformEvent::new(if input.approve {
            "carbon_registration.approved"
        } else {
            "carbon_registration.rejected"
        })
        .with_source("carbon_registration", registration.id)
        .with_actor(admin.user_id),
    );

    notify_owner(&state, project_id, &registration).await?;

    Ok(Json(registration))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a project and enforce owner-or-admin access.
async fn find_owned_project(
    state: &AppState,
    auth_user: &AuthUser,
    project_id: DbId,
) -> AppResult<verdex_db::models::project::Project> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    if project.owner_id != auth_user.user_id && auth_user.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner or an admin can access registrations".into(),
        )));
    }

    Ok(project)
}

/// Email the project owner about a registration review outcome.
async fn notify_owner(
    state: &AppState,
    project_id: DbId,
    registration: &CarbonRegistration,
) -> AppResult<()> {
    let Some(mailer) = state.mailer.clone() else {
        return Ok(());
    };

    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Registration project row is missing".into()))?;
    let owner = UserRepo::find_by_id(&state.pool, project.owner_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Project owner row is missing".into()))?;

    let subject = format!(
        "[Verdex] {} vintage {} was {}",
        project.name, registration.vintage_year, registration.status
    );
    let body = format!(
        "The {} vintage registration for '{}' ({:.2} tCO2e) was {}.\n",
        registration.vintage_year, project.name, registration.tonnes_co2e, registration.status
    );

    tokio::spawn(async move {
        if let Err(e) = mailer.send(&owner.email, &subject, &body).await {
            tracing::warn!(error = %e, "Failed to send registration review email");
        }
    });

    Ok(())
}
