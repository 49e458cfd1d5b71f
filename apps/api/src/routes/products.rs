//! Product catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporia_core::{Product, ProductUpdate};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::services::product_service::NewProduct;
use crate::state::AppState;

/// Product as exposed through the API.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub views_count: i64,
    pub sales_count: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id,
            name: product.name,
            description: product.description,
            price_cents: product.price_cents,
            category: product.category,
            sku: product.sku,
            image_url: product.image_url,
            views_count: product.views_count,
            sales_count: product.sales_count,
            current_stock: product.current_stock,
            minimum_stock: product.minimum_stock,
            is_active: product.is_active,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<i64>,
}

/// POST /products - create a product. Admin only.
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(new_product): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.products.create_product(new_product).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/trending?limit=N - most viewed products. Public.
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.get_trending(query.limit).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/{id} - fetch one product. Public.
///
/// Counts the view as a side effect for the trending ranking.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .products
        .get_product_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(product.into()))
}

/// PATCH /products/{id} - partial update. Admin only.
///
/// Absent fields keep their stored values; nullable fields sent as
/// explicit `null` are cleared.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(product_update): Json<ProductUpdate>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.update_product(&id, product_update).await?;
    Ok(Json(product.into()))
}
