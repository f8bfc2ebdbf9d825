//! Route definitions for the `/projects` resource.
//!
//! Also nests carbon registration routes under
//! `/projects/{project_id}/carbon/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{carbon, projects};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                -> list (public, approved only)
/// POST   /                                -> create (partner)
/// GET    /mine                            -> list_mine (auth)
/// GET    /{id}                            -> get_by_id
/// PUT    /{id}                            -> update (owner or admin)
/// DELETE /{id}                            -> delete (owner or admin)
/// POST   /{id}/review                     -> review (admin)
///
/// GET    /{project_id}/carbon             -> list_by_project (owner or admin)
/// POST   /{project_id}/carbon             -> create (owner, multipart)
/// GET    /{project_id}/carbon/{id}        -> get_by_id (owner or admin)
/// POST   /{project_id}/carbon/{id}/review -> review (admin)
/// ```
pub fn router() -> Router<AppState> {
    let carbon_routes = Router::new()
        .route("/", get(carbon::list_by_project).post(carbon::create))
        .route("/{id}", get(carbon::get_by_id))
        .route("/{id}/review", post(carbon::review));

    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route("/mine", get(projects::list_mine))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/{id}/review", post(projects::review))
        .nest("/{project_id}/carbon", carbon_routes)
}
