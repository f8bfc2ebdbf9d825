//! Route definitions for the `/orders` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET  /                  -> list_mine (auth)
/// POST /                  -> create (auth; calls the payment gateway)
/// GET  /{id}              -> get_by_id (owner or admin)
/// POST /{id}/cancel       -> cancel (owner, pending orders only)
/// POST /webhooks/payment  -> payment_webhook (gateway, HMAC-signed)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_mine).post(orders::create))
        .route("/webhooks/payment", post(orders::payment_webhook))
        .route("/{id}", get(orders::get_by_id))
        .route("/{id}/cancel", post(orders::cancel))
}
