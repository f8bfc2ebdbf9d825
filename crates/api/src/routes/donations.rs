//! Route definitions for the `/donations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::donations;
use crate::state::AppState;

/// Routes mounted at `/donations`.
///
/// ```text
/// GET  /      -> list (admin)
/// POST /      -> create (public)
/// GET  /mine  -> list_mine (auth)
/// GET  /{id}  -> get_by_id (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(donations::list).post(donations::create))
        .route("/mine", get(donations::list_mine))
        .route("/{id}", get(donations::get_by_id))
}
