//! Repository for the `orders` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::order::{status, CreateOrder, Order};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, product_id, quantity, amount_cents, currency, status, \
                        provider_ref, payment_url, created_at, updated_at";

/// Provides CRUD operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert a new order in `pending_payment` state, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (user_id, product_id, quantity, amount_cents, currency, status, provider_ref, payment_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(input.user_id)
            .bind(input.product_id)
            .bind(input.quantity)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(status::PENDING_PAYMENT)
            .bind(&input.provider_ref)
            .bind(&input.payment_url)
            .fetch_one(pool)
            .await
    }

    /// Find an order by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an order by the payment gateway's checkout reference.
    pub async fn find_by_provider_ref(
        pool: &PgPool,
        provider_ref: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE provider_ref = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(provider_ref)
            .fetch_optional(pool)
            .await
    }

    /// List a user's orders, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Order>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Transition an order from `from_status` to `to_status`.
    ///
    /// Returns the updated row, or `None` when the order does not exist or
    /// is not in `from_status` (guards against double webhook delivery).
    pub async fn transition_status(
        pool: &PgPool,
        id: DbId,
        from_status: &str,
        to_status: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $3
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(from_status)
            .bind(to_status)
            .fetch_optional(pool)
            .await
    }
}
