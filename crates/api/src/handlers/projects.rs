//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use verdex_core::error::CoreError;
use verdex_core::roles::ROLE_ADMIN;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::project::{status, CreateProject, Project, UpdateProject};
use verdex_db::repositories::ProjectRepo;
use verdex_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::{RequireAdmin, RequirePartner};
use crate::state::AppState;

/// Minimum accepted project description length.
const MIN_DESCRIPTION_LENGTH: usize = 40;

/// Request body for `POST /projects/{id}/review` (admin).
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// `true` approves, `false` rejects.
    pub approve: bool,
    pub note: Option<String>,
}

/// Rules for the project registration form.
///
/// Name uniqueness is scoped per owner, so the owner id is baked into the
/// async rule alongside the pool.
fn create_rules(pool: PgPool, owner_id: DbId) -> FormRules<CreateProject> {
    FormRules::new()
        .field(
            "name",
            vec![
                FieldRule::when(
                    |d: &CreateProject| d.name.trim().is_empty(),
                    "Name is required",
                ),
                FieldRule::when_async(
                    move |d: &CreateProject| {
                        let pool = pool.clone();
                        let name = d.name.trim().to_string();
                        async move {
                            ProjectRepo::find_by_owner_and_name(&pool, owner_id, &name)
                                .await
                                .map(|existing| existing.is_some())
                                .map_err(|e| CoreError::Internal(e.to_string()))
                        }
                    },
                    "You already have a project with this name",
                ),
            ],
        )
        .field(
            "country",
            vec![FieldRule::when(
                |d: &CreateProject| d.country.trim().is_empty(),
                "Country is required",
            )],
        )
        .field(
            "description",
            vec![
                FieldRule::when(
                    |d: &CreateProject| d.description.trim().is_empty(),
                    "Description is required",
                ),
                FieldRule::when(
                    |d: &CreateProject| d.description.trim().len() < MIN_DESCRIPTION_LENGTH,
                    "Description must be at least 40 characters",
                ),
            ],
        )
}

/// GET /api/v1/projects
///
/// Public catalog of approved projects.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Project>>> {
    let projects = ProjectRepo::list_approved(&state.pool).await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/mine
///
/// The caller's own projects, any status.
pub async fn list_mine(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Project>>> {
    let projects = ProjectRepo::list_by_owner(&state.pool, auth_user.user_id).await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/{id}
///
/// Approved projects are public; pending/rejected ones are visible only to
/// their owner and admins.
pub async fn get_by_id(
    State(state): State<AppState>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Project>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    if project.status != status::APPROVED && !can_manage(&project, auth_user.as_ref()) {
        // Hide the existence of unreviewed projects from outsiders.
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }

    Ok(Json(project))
}

/// POST /api/v1/projects (partner)
pub async fn create(
    State(state): State<AppState>,
    RequirePartner(user): RequirePartner,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let errors = validate_flow(&input, &create_rules(state.pool.clone(), user.user_id)).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let project = ProjectRepo::create(&state.pool, user.user_id, &input).await?;

    state.event_bus.publish(
        PlatformEvent::new("project.registered")
            .with_source("project", project.id)
            .with_actor(user.user_id),
    );

    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/v1/projects/{id} (owner or admin)
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    let project = find_managed(&state, &auth_user, id).await?;
    let updated = ProjectRepo::update(&state.pool, project.id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/projects/{id} (owner or admin)
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let project = find_managed(&state, &auth_user, id).await?;
    ProjectRepo::soft_delete(&state.pool, project.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/review (admin)
///
/// Approve or reject a project. The owner is notified by email when one is
/// configured.
pub async fn review(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<Project>> {
    let new_status = if input.approve {
        status::APPROVED
    } else {
        status::REJECTED
    };

    let project = ProjectRepo::set_review(&state.pool, id, new_status, input.note.as_deref())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    state.event_bus.publish(
        PlatformEvent::new(if input.approve {
            "project.approved"
        } else {
            "project.rejected"
        })
        .with_source("project", project.id)
        .with_actor(admin.user_id),
    );

    notify_owner(&state, &project).await?;

    Ok(Json(project))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether `auth_user` may manage (view/update/delete) this project.
fn can_manage(project: &Project, auth_user: Option<&AuthUser>) -> bool {
    match auth_user {
        Some(user) => user.role == ROLE_ADMIN || user.user_id == project.owner_id,
        None => false,
    }
}

/// Load a project and enforce owner-or-admin access.
async fn find_managed(state: &AppState, auth_user: &AuthUser, id: DbId) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    if !can_manage(&project, Some(auth_user)) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner or an admin can modify this project".into(),
        )));
    }

    Ok(project)
}

/// Email the project owner about a review outcome. Best-effort: a mail
/// failure is logged, not surfaced to the admin.
async fn notify_owner(state: &AppState, project: &Project) -> AppResult<()> {
    let Some(mailer) = state.mailer.clone() else {
        return Ok(());
    };

    let owner = verdex_db::repositories::UserRepo::find_by_id(&state.pool, project.owner_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Project owner row is missing".into()))?;

    let subject = format!("[Verdex] Project '{}' was {}", project.name, project.status);
    let body = match &project.review_note {
        Some(note) => format!(
            "Your project '{}' was {}.\n\nReviewer note: {note}\n",
            project.name, project.status
        ),
        None => format!("Your project '{}' was {}.\n", project.name, project.status),
    };

    tokio::spawn(async move {
        if let Err(e) = mailer.send(&owner.email, &subject, &body).await {
            tracing::warn!(error = %e, "Failed to send project review email");
        }
    });

    Ok(())
}
