//! Repository for the `news_articles` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::news::{CreateNewsArticle, NewsArticle, UpdateNewsArticle};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, author_id, title, slug, body, is_published, published_at, \
                        created_at, updated_at, deleted_at";

/// Provides CRUD operations for news articles.
pub struct NewsRepo;

impl NewsRepo {
    /// Insert a new article with a pre-computed slug, returning the created row.
    ///
    /// `published_at` is set when `is_published` is true at creation.
    pub async fn create(
        pool: &PgPool,
        author_id: DbId,
        slug: &str,
        input: &CreateNewsArticle,
    ) -> Result<NewsArticle, sqlx::Error> {
        let is_published = input.is_published.unwrap_or(false);
        let query = format!(
            "INSERT INTO news_articles (author_id, title, slug, body, is_published, published_at)
             VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(author_id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.body)
            .bind(is_published)
            .fetch_one(pool)
            .await
    }

    /// Find an article by internal ID (excluding soft-deleted rows).
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<NewsArticle>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM news_articles WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an article by slug (excluding soft-deleted rows).
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<NewsArticle>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM news_articles WHERE slug = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List published articles for the public feed, newest first.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<NewsArticle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM news_articles
             WHERE is_published = true AND deleted_at IS NULL
             ORDER BY published_at DESC"
        );
        sqlx::query_as::<_, NewsArticle>(&query).fetch_all(pool).await
    }

    /// List all non-deleted articles (admin view), newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<NewsArticle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM news_articles WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, NewsArticle>(&query).fetch_all(pool).await
    }

    /// Update an article. Only non-`None` fields in `input` are applied.
    ///
    /// Transitioning `is_published` to true stamps `published_at` once;
    /// unpublishing keeps the original timestamp.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNewsArticle,
    ) -> Result<Option<NewsArticle>, sqlx::Error> {
        let query = format!(
            "UPDATE news_articles SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                is_published = COALESCE($4, is_published),
                published_at = CASE
                    WHEN COALESCE($4, is_published) AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.is_published)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete an article. Returns `true` if the row was updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE news_articles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
