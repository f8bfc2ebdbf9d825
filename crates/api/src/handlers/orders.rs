//! Handlers for the `/orders` resource and the payment webhook.
//!
//! Order creation is the one flow that leaves the database: the total is
//! computed server-side from the product row, a checkout session is created
//! at the payment gateway, and the order row is persisted with the
//! resulting provider reference + hosted payment URL.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use verdex_core::certificates::generate_serial;
use verdex_core::error::CoreError;
use verdex_core::roles::ROLE_ADMIN;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::certificate::{source_type, CreateCertificate};
use verdex_db::models::order::{status, CreateOrder, Order};
use verdex_db::repositories::{
    AffiliateRepo, CertificateRepo, OrderRepo, ProductRepo, UserRepo,
};
use verdex_events::PlatformEvent;
use verdex_payment::{webhook, CheckoutRequest};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Affiliate commission on paid orders of referred buyers, in basis points.
const COMMISSION_RATE_BPS: i64 = 500;

/// Webhook signature header set by the payment gateway.
const SIGNATURE_HEADER: &str = "x-payment-signature";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: DbId,
    pub quantity: i32,
}

/// Webhook callback body from the payment gateway.
#[derive(Debug, Deserialize)]
struct PaymentCallback {
    provider_ref: String,
    /// `"paid"` or `"failed"`.
    status: String,
}

// ---------------------------------------------------------------------------
// Form rules
// ---------------------------------------------------------------------------

/// Rules for order placement. Product existence and stock are checked
/// against the database.
fn place_rules(pool: PgPool) -> FormRules<PlaceOrderRequest> {
    let product_pool = pool.clone();
    FormRules::new()
        .field(
            "product_id",
            vec![FieldRule::when_async(
                move |d: &PlaceOrderRequest| {
                    let pool = product_pool.clone();
                    let product_id = d.product_id;
                    async move {
                        ProductRepo::find_by_id(&pool, product_id)
                            .await
                            .map(|product| !product.is_some_and(|p| p.is_active))
                            .map_err(|e| CoreError::Internal(e.to_string()))
                    }
                },
                "Product is not available",
            )],
        )
        .field(
            "quantity",
            vec![
                FieldRule::when(
                    |d: &PlaceOrderRequest| d.quantity < 1,
                    "Quantity must be at least 1",
                ),
                FieldRule::when_async(
                    move |d: &PlaceOrderRequest| {
                        let pool = pool.clone();
                        let product_id = d.product_id;
                        let quantity = d.quantity;
                        async move {
                            ProductRepo::find_by_id(&pool, product_id)
                                .await
                                .map(|product| {
                                    // Missing products already fail the product_id rule.
                                    product.is_some_and(|p| p.stock_units < quantity)
                                })
                                .map_err(|e| CoreError::Internal(e.to_string()))
                        }
                    },
                    "Not enough stock for the requested quantity",
                ),
            ],
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/orders
///
/// Validate, reserve stock, create a gateway checkout session, and persist
/// the order in `pending_payment` state. A gateway failure releases the
/// reserved stock and surfaces as 502; no order row is written.
pub async fn create(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let errors = validate_flow(&input, &place_rules(state.pool.clone())).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let product = ProductRepo::find_by_id(&state.pool, input.product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: input.product_id,
        }))?;

    // Server-side total; the client never sends an amount.
    let amount_cents = product.price_cents * i64::from(input.quantity);

    // Reserve stock atomically before leaving the database, so two
    // concurrent buyers cannot both claim the last units.
    let reserved = ProductRepo::reserve_stock(&state.pool, product.id, input.quantity).await?;
    if !reserved {
        return Err(AppError::Core(CoreError::Conflict(
            "Not enough stock for the requested quantity".into(),
        )));
    }

    let checkout = CheckoutRequest {
        amount_cents,
        currency: product.currency.clone(),
        reference: format!("ord-{}", Uuid::new_v4()),
        description: format!("{} x {}", input.quantity, product.name),
    };

    let session = match state.payment.create_checkout(&checkout).await {
        Ok(session) => session,
        Err(e) => {
            ProductRepo::release_stock(&state.pool, product.id, input.quantity).await?;
            return Err(AppError::Payment(e));
        }
    };

    let order = OrderRepo::create(
        &state.pool,
        &CreateOrder {
            user_id: auth_user.user_id,
            product_id: product.id,
            quantity: input.quantity,
            amount_cents,
            currency: product.currency.clone(),
            provider_ref: session.provider_ref,
            payment_url: session.checkout_url,
        },
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new("order.created")
            .with_source("order", order.id)
            .with_actor(auth_user.user_id),
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/v1/orders
///
/// The caller's own orders.
pub async fn list_mine(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = OrderRepo::list_by_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(orders))
}

/// GET /api/v1/orders/{id} (owner or admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Order>> {
    let order = find_owned(&state, &auth_user, id).await?;
    Ok(Json(order))
}

/// POST /api/v1/orders/{id}/cancel (owner)
///
/// Cancels an order that has not been paid yet and returns its stock.
pub async fn cancel(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Order>> {
    let order = find_owned(&state, &auth_user, id).await?;

    let cancelled =
        OrderRepo::transition_status(&state.pool, order.id, status::PENDING_PAYMENT, status::CANCELLED)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "Only orders awaiting payment can be cancelled".into(),
                ))
            })?;

    ProductRepo::release_stock(&state.pool, cancelled.product_id, cancelled.quantity).await?;

    Ok(Json(cancelled))
}

/// POST /api/v1/orders/webhooks/payment
///
/// Gateway status callback. The body is HMAC-signed; an invalid signature
/// is rejected before any parsing. Retries on an already-processed order
/// are acknowledged with 200 (the status transition is the idempotency
/// guard).
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing webhook signature".into()))
        })?;

    if !webhook::verify(state.payment.webhook_secret(), &body, signature) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let callback: PaymentCallback = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook body: {e}")))?;

    let order = OrderRepo::find_by_provider_ref(&state.pool, &callback.provider_ref)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "No order for provider_ref {}",
                callback.provider_ref
            ))
        })?;

    match callback.status.as_str() {
        "paid" => {
            let Some(paid) =
                OrderRepo::transition_status(&state.pool, order.id, status::PENDING_PAYMENT, status::PAID)
                    .await?
            else {
                // Duplicate delivery; already settled.
                return Ok(StatusCode::OK);
            };
            fulfill_paid_order(&state, &paid).await?;
        }
        "failed" => {
            let failed =
                OrderRepo::transition_status(&state.pool, order.id, status::PENDING_PAYMENT, status::FAILED)
                    .await?;
            if let Some(failed) = failed {
                ProductRepo::release_stock(&state.pool, failed.product_id, failed.quantity)
                    .await?;
                state
                    .event_bus
                    .publish(PlatformEvent::new("order.failed").with_source("order", failed.id));
            }
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown payment status '{other}'"
            )));
        }
    }

    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an order and enforce owner-or-admin access.
async fn find_owned(state: &AppState, auth_user: &AuthUser, id: DbId) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;

    if order.user_id != auth_user.user_id && auth_user.role != ROLE_ADMIN {
        // Hide other users' orders.
        return Err(AppError::Core(CoreError::NotFound { entity: "Order", id }));
    }

    Ok(order)
}

/// Post-payment fulfillment: issue the retirement certificate, accrue
/// affiliate commission for referred buyers, send the receipt, publish the
/// event.
async fn fulfill_paid_order(state: &AppState, order: &Order) -> AppResult<()> {
    let buyer = UserRepo::find_by_id(&state.pool, order.user_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Order buyer row is missing".into()))?;

    let product = ProductRepo::find_by_id(&state.pool, order.product_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Order product row is missing".into()))?;

    let tonnes = product.unit_tonnes_co2e * f64::from(order.quantity);
    let serial = generate_serial(chrono::Datelike::year(&chrono::Utc::now()));

    let certificate = CertificateRepo::create(
        &state.pool,
        &CreateCertificate {
            serial,
            holder_user_id: Some(buyer.id),
            holder_name: buyer.name.clone(),
            source_type: source_type::ORDER.to_string(),
            source_id: order.id,
            tonnes_co2e: tonnes,
        },
    )
    .await?;

    if let Some(affiliate_id) = buyer.referred_by {
        let commission = order.amount_cents * COMMISSION_RATE_BPS / 10_000;
        AffiliateRepo::add_commission(&state.pool, affiliate_id, commission).await?;
    }

    if let Some(mailer) = state.mailer.clone() {
        let to = buyer.email.clone();
        let subject = "[Verdex] Your carbon credits are retired".to_string();
        let body = format!(
            "Thank you for your order #{}.\n\n\
             {:.2} tonnes CO2e have been retired on your behalf.\n\
             Certificate serial: {}\n",
            order.id, tonnes, certificate.serial
        );
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &body).await {
                tracing::warn!(error = %e, "Failed to send order receipt email");
            }
        });
    }

    state.event_bus.publish(
        PlatformEvent::new("order.paid")
            .with_source("order", order.id)
            .with_actor(buyer.id)
            .with_payload(serde_json::json!({
                "amount_cents": order.amount_cents,
                "tonnes_co2e": tonnes,
                "certificate_serial": certificate.serial,
            })),
    );

    Ok(())
}
