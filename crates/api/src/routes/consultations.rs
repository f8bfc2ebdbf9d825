//! Route definitions for the `/consultations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::consultations;
use crate::state::AppState;

/// Routes mounted at `/consultations`.
///
/// ```text
/// GET  /              -> list (admin, ?status= filter)
/// POST /              -> create (public)
/// POST /{id}/status   -> set_status (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(consultations::list).post(consultations::create))
        .route("/{id}/status", post(consultations::set_status))
}
