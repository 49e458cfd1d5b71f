//! # Product Service
//!
//! Product catalog management and the trending ranking.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use emporia_core::validation::{validate_price_cents, validate_product_name, validate_sku};
use emporia_core::{CoreError, Product, ProductUpdate, ValidationError};
use emporia_db::repository::product::generate_product_id;
use emporia_db::Database;

use crate::error::ApiError;

/// Default trending page size.
const DEFAULT_TRENDING_LIMIT: i64 = 5;
/// Hard cap on the trending page size.
const MAX_TRENDING_LIMIT: i64 = 50;

fn default_minimum_stock() -> i64 {
    10
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category: String,
    pub sku: String,
    pub image_url: Option<String>,
    /// Initial stock on hand.
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default = "default_minimum_stock")]
    pub minimum_stock: i64,
}

/// Service for product catalog operations.
#[derive(Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    /// Creates a new ProductService.
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    /// Creates a new product, rejecting duplicate SKUs.
    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product, ApiError> {
        validate_product_name(&new_product.name)?;
        validate_sku(&new_product.sku)?;
        validate_price_cents(new_product.price_cents)?;
        if new_product.current_stock < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "current_stock".to_string(),
            }
            .into());
        }

        let products = self.db.products();

        if products.get_by_sku(&new_product.sku).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "A product with SKU '{}' already exists",
                new_product.sku
            )));
        }

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: new_product.name,
            description: new_product.description,
            price_cents: new_product.price_cents,
            category: new_product.category,
            sku: new_product.sku,
            image_url: new_product.image_url,
            views_count: 0,
            sales_count: 0,
            current_stock: new_product.current_stock,
            minimum_stock: new_product.minimum_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        products.insert(&product).await?;

        info!(product_id = %product.id, sku = %product.sku, "Product created");

        Ok(product)
    }

    /// Gets a product by ID, counting the view as a side effect.
    ///
    /// The view counter is bumped with a single atomic UPDATE; it doubles
    /// as the existence check, so a missing product costs one statement.
    pub async fn get_product_by_id(&self, id: &str) -> Result<Option<Product>, ApiError> {
        let products = self.db.products();

        if !products.increment_views(id).await? {
            return Ok(None);
        }

        Ok(products.get_by_id(id).await?)
    }

    /// Gets the most viewed products.
    pub async fn get_trending(&self, limit: Option<i64>) -> Result<Vec<Product>, ApiError> {
        let limit = limit
            .unwrap_or(DEFAULT_TRENDING_LIMIT)
            .clamp(1, MAX_TRENDING_LIMIT);

        Ok(self.db.products().get_trending(limit).await?)
    }

    /// Applies a partial update to a product.
    ///
    /// Unset fields are left alone; nullable fields sent as explicit `null`
    /// are cleared. Stock is not updatable here - it only moves through
    /// stock movements.
    pub async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> Result<Product, ApiError> {
        let products = self.db.products();

        let mut product = products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if update.is_empty() {
            return Ok(product);
        }

        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(price_cents) = update.price_cents {
            validate_price_cents(price_cents)?;
        }
        if let Some(sku) = &update.sku {
            validate_sku(sku)?;
            if let Some(existing) = products.get_by_sku(sku).await? {
                if existing.id != product.id {
                    return Err(ApiError::Conflict(format!(
                        "A product with SKU '{}' already exists",
                        sku
                    )));
                }
            }
        }

        update.apply(&mut product);
        products.update(&product).await?;

        info!(product_id = %product.id, "Product updated");

        // Re-read so the caller sees the repository-written timestamp
        products
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::Internal("Product vanished during update".to_string()))
    }
}
