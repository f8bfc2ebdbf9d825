//! Repository for the `products` table.

use sqlx::PgPool;
use verdex_core::types::DbId;

use crate::models::product::{CreateProduct, Product, UpdateProduct};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, price_cents, currency, unit_tonnes_co2e, \
                        stock_units, is_active, created_at, updated_at, deleted_at";

/// Default currency when a create payload omits one.
const DEFAULT_CURRENCY: &str = "EUR";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, description, price_cents, currency, unit_tonnes_co2e, stock_units)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
            .bind(input.unit_tonnes_co2e)
            .bind(input.stock_units)
            .fetch_one(pool)
            .await
    }

    /// Find a product by internal ID (excluding soft-deleted rows).
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active products for the public catalog, newest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE is_active = true AND deleted_at IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// List all non-deleted products (admin view), newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Update a product. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                unit_tonnes_co2e = COALESCE($5, unit_tonnes_co2e),
                stock_units = COALESCE($6, stock_units),
                is_active = COALESCE($7, is_active)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(input.unit_tonnes_co2e)
            .bind(input.stock_units)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a product. Returns `true` if the row was updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically reserve `quantity` units of stock.
    ///
    /// Returns `false` when the product has insufficient stock (no row
    /// updated), so callers can reject the order without a race.
    pub async fn reserve_stock(
        pool: &PgPool,
        id: DbId,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET stock_units = stock_units - $2
             WHERE id = $1 AND deleted_at IS NULL AND stock_units >= $2",
        )
        .bind(id)
        .bind(quantity)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return previously reserved stock (payment failed or order cancelled).
    pub async fn release_stock(
        pool: &PgPool,
        id: DbId,
        quantity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET stock_units = stock_units + $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(pool)
            .await?;
        Ok(())
    }
}
