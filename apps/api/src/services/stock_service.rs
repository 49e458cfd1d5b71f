//! # Stock Service
//!
//! Manual stock movement registration and ledger queries.
//!
//! Registration is the standalone path into the stock ledger (goods
//! received, corrections); the order service has its own path for sales
//! and cancellations. Both obey the same rule: stock update and ledger row
//! commit in one transaction.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use emporia_core::validation::validate_quantity;
use emporia_core::{CoreError, StockMovement, StockMovementType};
use emporia_db::repository::product::ProductRepository;
use emporia_db::repository::stock::{generate_movement_id, StockRepository};
use emporia_db::{Database, DbError};

use crate::error::ApiError;

/// Payload for registering a stock movement.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovement {
    pub product_id: String,
    pub movement_type: StockMovementType,
    /// Magnitude of the change; must be positive. Inbound and adjustment
    /// movements add to stock, outbound subtracts.
    pub quantity: i64,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Service for the stock movement ledger.
#[derive(Clone)]
pub struct StockService {
    db: Database,
    tx_timeout: Duration,
}

impl StockService {
    /// Creates a new StockService.
    pub fn new(db: Database, tx_timeout: Duration) -> Self {
        StockService { db, tx_timeout }
    }

    /// Registers a stock movement and updates the product's stock atomically.
    ///
    /// ## Failure
    /// * `NotFound` - product does not exist
    /// * `InsufficientStock` - outbound quantity exceeds current stock
    pub async fn register_movement(
        &self,
        admin_id: &str,
        movement: NewMovement,
    ) -> Result<StockMovement, ApiError> {
        validate_quantity(movement.quantity)?;

        match tokio::time::timeout(
            self.tx_timeout,
            self.register_movement_tx(admin_id, &movement),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Unavailable(
                "Stock transaction timed out; no changes were committed".to_string(),
            )),
        }
    }

    async fn register_movement_tx(
        &self,
        admin_id: &str,
        movement: &NewMovement,
    ) -> Result<StockMovement, ApiError> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        let product = ProductRepository::fetch_by_id(&mut tx, &movement.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(movement.product_id.clone()))?;

        let delta = movement.movement_type.signed_delta(movement.quantity);

        if delta < 0 && !product.has_stock(movement.quantity) {
            return Err(CoreError::InsufficientStock {
                name: product.name,
                available: product.current_stock,
                requested: movement.quantity,
            }
            .into());
        }

        // Guarded delta: under concurrency the UPDATE itself decides, the
        // read above only shapes the error message
        let applied =
            ProductRepository::apply_stock_delta(&mut tx, &product.id, delta, 0, now).await?;
        if !applied {
            return Err(CoreError::InsufficientStock {
                name: product.name,
                available: product.current_stock,
                requested: movement.quantity,
            }
            .into());
        }

        let stock_after = ProductRepository::fetch_stock(&mut tx, &product.id).await?;

        let record = StockMovement {
            id: generate_movement_id(),
            product_id: product.id.clone(),
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            stock_before: stock_after - delta,
            stock_after,
            order_id: None,
            reason: movement.reason.clone(),
            notes: movement.notes.clone(),
            performed_by: Some(admin_id.to_string()),
            created_at: now,
        };

        StockRepository::insert_movement(&mut tx, &record).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = %record.product_id,
            movement_type = ?record.movement_type,
            quantity = %record.quantity,
            stock_after = %record.stock_after,
            "Stock movement registered"
        );

        Ok(record)
    }

    /// Gets a product's movement history, newest first.
    ///
    /// ## Failure
    /// * `NotFound` - product does not exist
    pub async fn get_product_movements(
        &self,
        product_id: &str,
    ) -> Result<Vec<StockMovement>, ApiError> {
        if self.db.products().get_by_id(product_id).await?.is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        Ok(self.db.stock_movements().list_by_product(product_id).await?)
    }
}
