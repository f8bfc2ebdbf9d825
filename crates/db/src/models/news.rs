//! News article model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// A news article row from the `news_articles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewsArticle {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    /// URL-safe identifier derived from the title, unique
    /// (`uq_news_articles_slug`).
    pub slug: String,
    pub body: String,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

/// DTO for creating a news article.
#[derive(Debug, Deserialize)]
pub struct CreateNewsArticle {
    pub title: String,
    pub body: String,
    pub is_published: Option<bool>,
}

/// DTO for updating a news article. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateNewsArticle {
    pub title: Option<String>,
    pub body: Option<String>,
    pub is_published: Option<bool>,
}
