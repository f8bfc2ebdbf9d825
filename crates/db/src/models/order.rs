//! Order model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// Order lifecycle states stored in `orders.status`.
///
/// Must match the CHECK constraint in the orders migration.
pub mod status {
    pub const PENDING_PAYMENT: &str = "pending_payment";
    pub const PAID: &str = "paid";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
}

/// An order row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub product_id: DbId,
    pub quantity: i32,
    /// Total charged amount in integer cents, computed server-side.
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    /// Checkout reference assigned by the payment gateway.
    pub provider_ref: Option<String>,
    /// Hosted payment page for the buyer.
    pub payment_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for persisting a new order after the gateway checkout succeeded.
#[derive(Debug)]
pub struct CreateOrder {
    pub user_id: DbId,
    pub product_id: DbId,
    pub quantity: i32,
    pub amount_cents: i64,
    pub currency: String,
    pub provider_ref: String,
    pub payment_url: String,
}
