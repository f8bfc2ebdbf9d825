//! Handlers for the `/news` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use verdex_core::error::CoreError;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::news::{CreateNewsArticle, NewsArticle, UpdateNewsArticle};
use verdex_db::repositories::NewsRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for article creation. Slug uniqueness is checked against the
/// database using the slug derived from the submitted title.
fn create_rules(pool: PgPool) -> FormRules<CreateNewsArticle> {
    FormRules::new()
        .field(
            "title",
            vec![
                FieldRule::when(
                    |d: &CreateNewsArticle| d.title.trim().is_empty(),
                    "Title is required",
                ),
                FieldRule::when(
                    |d: &CreateNewsArticle| slugify(&d.title).is_empty(),
                    "Title must contain at least one alphanumeric character",
                ),
                FieldRule::when_async(
                    move |d: &CreateNewsArticle| {
                        let pool = pool.clone();
                        let slug = slugify(&d.title);
                        async move {
                            NewsRepo::find_by_slug(&pool, &slug)
                                .await
                                .map(|existing| existing.is_some())
                                .map_err(|e| CoreError::Internal(e.to_string()))
                        }
                    },
                    "An article with this title already exists",
                ),
            ],
        )
        .field(
            "body",
            vec![FieldRule::when(
                |d: &CreateNewsArticle| d.body.trim().is_empty(),
                "Body is required",
            )],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/news
///
/// Public feed of published articles.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<NewsArticle>>> {
    let articles = NewsRepo::list_published(&state.pool).await?;
    Ok(Json(articles))
}

/// GET /api/v1/news/all (admin)
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<NewsArticle>>> {
    let articles = NewsRepo::list_all(&state.pool).await?;
    Ok(Json(articles))
}

/// GET /api/v1/news/{slug}
///
/// Public article lookup. Unpublished articles 404 for everyone; admins
/// manage drafts through the id-based endpoints.
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<NewsArticle>> {
    let article = NewsRepo::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|a| a.is_published)
        .ok_or_else(|| AppError::NotFound(format!("No published article with slug '{slug}'")))?;
    Ok(Json(article))
}

/// POST /api/v1/news (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateNewsArticle>,
) -> AppResult<(StatusCode, Json<NewsArticle>)> {
    let errors = validate_flow(&input, &create_rules(state.pool.clone())).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let slug = slugify(&input.title);
    let article = NewsRepo::create(&state.pool, admin.user_id, &slug, &input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT /api/v1/news/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNewsArticle>,
) -> AppResult<Json<NewsArticle>> {
    let article = NewsRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "NewsArticle",
            id,
        }))?;
    Ok(Json(article))
}

/// DELETE /api/v1/news/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = NewsRepo::soft_delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "NewsArticle",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Derive a URL-safe slug from a title: lowercase, alphanumerics kept,
/// runs of anything else collapsed to single dashes.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
