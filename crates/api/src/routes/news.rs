//! Route definitions for the `/news` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::news;
use crate::state::AppState;

/// Routes mounted at `/news`.
///
/// Slugs never start with a digit-only segment, but ids are numeric, so the
/// id-based admin routes live under `/id/{id}` to avoid ambiguity with
/// `/{slug}`.
///
/// ```text
/// GET    /         -> list (public, published)
/// POST   /         -> create (admin)
/// GET    /all      -> list_all (admin)
/// GET    /{slug}   -> get_by_slug (public)
/// PUT    /id/{id}  -> update (admin)
/// DELETE /id/{id}  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(news::list).post(news::create))
        .route("/all", get(news::list_all))
        .route("/id/{id}", put(news::update).delete(news::delete))
        .route("/{slug}", get(news::get_by_slug))
}
