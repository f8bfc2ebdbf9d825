//! Route definitions for the `/affiliates` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::affiliates;
use crate::state::AppState;

/// Routes mounted at `/affiliates`.
///
/// ```text
/// POST /              -> enroll (auth)
/// GET  /me            -> me (auth)
/// GET  /me/referrals  -> my_referrals (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(affiliates::enroll))
        .route("/me", get(affiliates::me))
        .route("/me/referrals", get(affiliates::my_referrals))
}
