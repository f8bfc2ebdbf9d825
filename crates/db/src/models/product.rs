//! Carbon-credit product model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use verdex_core::types::{DbId, Timestamp};

/// A product row from the `products` table.
///
/// A product is a purchasable carbon-credit lot: each unit retires
/// `unit_tonnes_co2e` tonnes of CO2e and costs `price_cents`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Price per unit in integer cents.
    pub price_cents: i64,
    /// ISO 4217 currency code (e.g. `"EUR"`).
    pub currency: String,
    /// Tonnes of CO2e retired per purchased unit.
    pub unit_tonnes_co2e: f64,
    /// Units still available for purchase.
    pub stock_units: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

/// DTO for creating a new product.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: Option<String>,
    pub unit_tonnes_co2e: f64,
    pub stock_units: i32,
}

/// DTO for updating an existing product. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub unit_tonnes_co2e: Option<f64>,
    pub stock_units: Option<i32>,
    pub is_active: Option<bool>,
}
