pub mod affiliates;
pub mod auth;
pub mod certificates;
pub mod consultations;
pub mod donations;
pub mod health;
pub mod news;
pub mod orders;
pub mod products;
pub mod projects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                               register (public)
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout (requires auth)
///
/// /products                                    list (public), create (admin)
/// /products/{id}                               get (public), update, delete (admin)
///
/// /orders                                      list own, place order (auth)
/// /orders/{id}                                 get (owner or admin)
/// /orders/{id}/cancel                          cancel pending order (owner)
/// /orders/webhooks/payment                     gateway callback (HMAC-signed)
///
/// /projects                                    list approved (public), create (partner)
/// /projects/mine                               own projects (auth)
/// /projects/{id}                               get, update, delete (owner or admin)
/// /projects/{id}/review                        approve/reject (admin)
/// /projects/{project_id}/carbon                list, submit registration (owner)
/// /projects/{project_id}/carbon/{id}           get registration + documents
/// /projects/{project_id}/carbon/{id}/review    approve/reject (admin)
///
/// /donations                                   list (admin), donate (public)
/// /donations/mine                              own donations (auth)
/// /donations/{id}                              get (admin)
///
/// /affiliates                                  enroll (auth)
/// /affiliates/me                               own stats (auth)
/// /affiliates/me/referrals                     referred users (auth)
///
/// /consultations                               list (admin), request (public)
/// /consultations/{id}/status                   triage (admin)
///
/// /news                                        published feed (public), create (admin)
/// /news/all                                    all articles (admin)
/// /news/{slug}                                 published article (public)
/// /news/{id}                                   update, delete (admin)
///
/// /certificates/mine                           own certificates (auth)
/// /certificates/verify/{serial}                public verification
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (register, login, refresh, logout).
        .nest("/auth", auth::router())
        // Carbon-credit product catalog.
        .nest("/products", products::router())
        // Orders and the payment gateway webhook.
        .nest("/orders", orders::router())
        // Projects, including nested carbon registrations.
        .nest("/projects", projects::router())
        // Donations.
        .nest("/donations", donations::router())
        // Affiliate enrollment and referral stats.
        .nest("/affiliates", affiliates::router())
        // Public consultation requests and admin triage.
        .nest("/consultations", consultations::router())
        // News articles.
        .nest("/news", news::router())
        // Certificates: own list and public verification.
        .nest("/certificates", certificates::router())
}
