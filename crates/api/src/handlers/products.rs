//! Handlers for the `/products` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use verdex_core::error::CoreError;
use verdex_core::types::DbId;
use verdex_core::validation::{validate_flow, FieldRule, FormRules};
use verdex_db::models::product::{CreateProduct, Product, UpdateProduct};
use verdex_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Rules for the product creation form. All checks are synchronous.
fn create_rules() -> FormRules<CreateProduct> {
    FormRules::new()
        .field(
            "name",
            vec![FieldRule::when(
                |d: &CreateProduct| d.name.trim().is_empty(),
                "Name is required",
            )],
        )
        .field(
            "price_cents",
            vec![FieldRule::when(
                |d: &CreateProduct| d.price_cents <= 0,
                "Price must be positive",
            )],
        )
        .field(
            "unit_tonnes_co2e",
            vec![FieldRule::when(
                |d: &CreateProduct| d.unit_tonnes_co2e <= 0.0,
                "Tonnes per unit must be positive",
            )],
        )
        .field(
            "stock_units",
            vec![FieldRule::when(
                |d: &CreateProduct| d.stock_units < 0,
                "Stock cannot be negative",
            )],
        )
}

/// GET /api/v1/products
///
/// Public catalog: active products only.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = ProductRepo::list_active(&state.pool).await?;
    Ok(Json(products))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Product>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(product))
}

/// POST /api/v1/products (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let errors = validate_flow(&input, &create_rules()).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let product = ProductRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<Product>> {
    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(product))
}

/// DELETE /api/v1/products/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ProductRepo::soft_delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))
    }
}
