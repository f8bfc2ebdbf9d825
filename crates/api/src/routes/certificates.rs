//! Route definitions for the `/certificates` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::certificates;
use crate::state::AppState;

/// Routes mounted at `/certificates`.
///
/// ```text
/// GET /mine             -> list_mine (auth)
/// GET /verify/{serial}  -> verify (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(certificates::list_mine))
        .route("/verify/{serial}", get(certificates::verify))
}
