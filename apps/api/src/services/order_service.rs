//! # Order Service
//!
//! The order/stock transaction coordinator.
//!
//! ## Create Flow (single transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /orders                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   for each requested line, in request order:                            │
//! │     1. fetch product          ── missing? abort whole order (404)       │
//! │     2. check stock            ── short? abort whole order (400)         │
//! │     3. snapshot price + name, accumulate subtotal                       │
//! │     4. guarded stock decrement (compare-and-swap on current_stock)      │
//! │     5. append OUTBOUND ledger row (before/after bracket the decrement)  │
//! │   insert order (PENDING) + line items                                   │
//! │  COMMIT ── or roll back every step above                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation reverses the stock effects line by line (INBOUND rows) in
//! one transaction with the status write. Any early return before COMMIT
//! drops the transaction, which rolls everything back - no partial stock
//! decrements or orphaned ledger rows can survive a failed call.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use emporia_core::validation::{validate_order_lines, validate_quantity};
use emporia_core::{
    CoreError, Money, Order, OrderDetail, OrderItem, OrderStatus, StockMovement, StockMovementType,
};
use emporia_db::repository::order::{
    generate_order_id, generate_order_item_id, generate_order_number, OrderRepository,
};
use emporia_db::repository::product::ProductRepository;
use emporia_db::repository::stock::{generate_movement_id, StockRepository};
use emporia_db::{Database, DbError};

use crate::error::ApiError;

/// One requested line: which product, how many.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Payload for creating an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub notes: Option<String>,
}

/// Service coordinating orders, product stock and the movement ledger.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    tx_timeout: Duration,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(db: Database, tx_timeout: Duration) -> Self {
        OrderService { db, tx_timeout }
    }

    /// Creates an order, validating stock and computing totals.
    ///
    /// Everything happens in one transaction: order row, line items, stock
    /// decrements and one OUTBOUND ledger row per line. A failure on any
    /// line aborts the entire operation - no partial orders.
    ///
    /// ## Failure
    /// * `NotFound` - a referenced product does not exist
    /// * `InsufficientStock` - a line requests more than is on hand
    /// * `Unavailable` - the transaction timed out and was rolled back
    pub async fn create_order(
        &self,
        user_id: &str,
        new_order: NewOrder,
    ) -> Result<OrderDetail, ApiError> {
        validate_order_lines(new_order.items.len())?;
        for line in &new_order.items {
            validate_quantity(line.quantity)?;
        }

        match tokio::time::timeout(self.tx_timeout, self.create_order_tx(user_id, &new_order)).await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Unavailable(
                "Order transaction timed out; no changes were committed".to_string(),
            )),
        }
    }

    async fn create_order_tx(
        &self,
        user_id: &str,
        new_order: &NewOrder,
    ) -> Result<OrderDetail, ApiError> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        let order_id = generate_order_id();
        let order_number = generate_order_number(user_id);

        let mut subtotal = Money::zero();
        let mut items: Vec<OrderItem> = Vec::with_capacity(new_order.items.len());

        for line in &new_order.items {
            let product = ProductRepository::fetch_by_id(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.has_stock(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            // Snapshot price and name at decision time
            let unit_price = product.price();
            let line_subtotal = unit_price * line.quantity;
            subtotal += line_subtotal;

            // Guarded decrement: the UPDATE is the arbiter under
            // concurrency, the read above only shaped the error message
            let reserved = ProductRepository::apply_stock_delta(
                &mut tx,
                &product.id,
                -line.quantity,
                line.quantity,
                now,
            )
            .await?;
            if !reserved {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            let stock_after = ProductRepository::fetch_stock(&mut tx, &product.id).await?;

            let movement = StockMovement {
                id: generate_movement_id(),
                product_id: product.id.clone(),
                movement_type: StockMovementType::Outbound,
                quantity: line.quantity,
                stock_before: stock_after + line.quantity,
                stock_after,
                order_id: Some(order_id.clone()),
                reason: Some(format!("Sale - order {}", order_number)),
                notes: Some(format!("Order placed by user {}", user_id)),
                performed_by: None,
                created_at: now,
            };
            StockRepository::insert_movement(&mut tx, &movement).await?;

            items.push(OrderItem {
                id: generate_order_item_id(),
                order_id: order_id.clone(),
                product_id: product.id,
                product_name: product.name,
                quantity: line.quantity,
                unit_price_cents: unit_price.cents(),
                subtotal_cents: line_subtotal.cents(),
                created_at: now,
            });
        }

        // Tax and shipping are reserved fields, zero in the current scope
        let tax = Money::zero();
        let shipping_cost = Money::zero();
        let total = subtotal + tax + shipping_cost;

        let order = Order {
            id: order_id,
            order_number,
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            shipping_cost_cents: shipping_cost.cents(),
            total_cents: total.cents(),
            shipping_address: new_order.shipping_address.clone(),
            shipping_city: new_order.shipping_city.clone(),
            shipping_postal_code: new_order.shipping_postal_code.clone(),
            notes: new_order.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        OrderRepository::insert_order(&mut tx, &order).await?;
        for item in &items {
            OrderRepository::insert_item(&mut tx, item).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_number = %order.order_number,
            user_id = %user_id,
            total_cents = %order.total_cents,
            lines = items.len(),
            "Order created"
        );

        Ok(OrderDetail { order, items })
    }

    /// Updates an order's status, enforcing the state machine.
    ///
    /// Transitions only move forward (pending → confirmed → shipped →
    /// delivered) or to cancelled from any non-terminal state; anything
    /// else is rejected with a 409.
    ///
    /// On cancellation every line item's stock effect is reversed: the
    /// product (if it still exists - a vanished product is skipped, not an
    /// error) gets its stock back and an INBOUND ledger row, committed
    /// atomically with the status write.
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<OrderDetail, ApiError> {
        match tokio::time::timeout(self.tx_timeout, self.update_status_tx(order_id, new_status))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Unavailable(
                "Status transaction timed out; no changes were committed".to_string(),
            )),
        }
    }

    async fn update_status_tx(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<OrderDetail, ApiError> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        let mut order = OrderRepository::fetch_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        order.status.ensure_transition_to(new_status)?;

        let items = OrderRepository::fetch_items(&mut tx, order_id).await?;

        if new_status == OrderStatus::Cancelled {
            for item in &items {
                let Some(product) =
                    ProductRepository::fetch_by_id(&mut tx, &item.product_id).await?
                else {
                    warn!(
                        product_id = %item.product_id,
                        order_id = %order_id,
                        "Product missing during cancellation, skipping restock"
                    );
                    continue;
                };

                let restocked = ProductRepository::apply_stock_delta(
                    &mut tx,
                    &product.id,
                    item.quantity,
                    -item.quantity,
                    now,
                )
                .await?;
                if !restocked {
                    continue;
                }

                let stock_after = ProductRepository::fetch_stock(&mut tx, &product.id).await?;

                let movement = StockMovement {
                    id: generate_movement_id(),
                    product_id: product.id.clone(),
                    movement_type: StockMovementType::Inbound,
                    quantity: item.quantity,
                    stock_before: stock_after - item.quantity,
                    stock_after,
                    order_id: Some(order.id.clone()),
                    reason: Some(format!("Cancellation - order {}", order.order_number)),
                    notes: Some("Stock returned on order cancellation".to_string()),
                    performed_by: None,
                    created_at: now,
                };
                StockRepository::insert_movement(&mut tx, &movement).await?;
            }
        }

        OrderRepository::set_status(&mut tx, &order.id, new_status, now).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_number = %order.order_number,
            previous = %order.status,
            next = %new_status,
            "Order status updated"
        );

        order.status = new_status;
        order.updated_at = now;

        Ok(OrderDetail { order, items })
    }

    /// Gets an order with its items.
    pub async fn get_order(&self, order_id: &str) -> Result<Option<OrderDetail>, ApiError> {
        let orders = self.db.orders();

        let Some(order) = orders.get_by_id(order_id).await? else {
            return Ok(None);
        };
        let items = orders.get_items(order_id).await?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// Gets all orders of a user with their items, newest first.
    ///
    /// Items for the whole history are loaded in one query and grouped
    /// in memory - no per-order round trips.
    pub async fn list_user_orders(&self, user_id: &str) -> Result<Vec<OrderDetail>, ApiError> {
        let orders_repo = self.db.orders();

        let orders = orders_repo.list_by_user(user_id).await?;

        let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for item in orders_repo.list_items_for_user(user_id).await? {
            items_by_order
                .entry(item.order_id.clone())
                .or_default()
                .push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }
}
