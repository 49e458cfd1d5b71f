//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (single transaction, driven by the order service)            │
//! │     ├── insert_order() → Order { status: Pending }                      │
//! │     ├── insert_item() per line (price + name frozen)                    │
//! │     ├── stock decrement per line (product repository)                   │
//! │     └── ledger row per line (stock repository)                          │
//! │                                                                         │
//! │  2. PROGRESS                                                            │
//! │     └── set_status() → Confirmed → Shipped → Delivered                  │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                   │
//! │     └── set_status(Cancelled) + stock returned, same transaction        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, subtotal_cents, tax_cents, \
     shipping_cost_cents, total_cents, shipping_address, shipping_city, \
     shipping_postal_code, notes, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, unit_price_cents, subtotal_cents, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_by_id(&mut conn, id).await
    }

    /// Gets an order by ID on an explicit connection (transaction-scoped).
    pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    /// Inserts an order row.
    pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status,
                subtotal_cents, tax_cents, shipping_cost_cents, total_cents,
                shipping_address, shipping_city, shipping_postal_code, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cost_cents)
        .bind(order.total_cents)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(&order.shipping_postal_code)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a line item.
    ///
    /// ## Snapshot Pattern
    /// Product name and unit price are copied onto the item, preserving
    /// order history even if the product changes later.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        debug!(order_id = %item.order_id, product_id = %item.product_id, "Inserting order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name,
                quantity, unit_price_cents, subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets all items for an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_items(&mut conn, order_id).await
    }

    /// Gets all items for an order on an explicit connection.
    pub async fn fetch_items(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Gets all orders of a user, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets the items of every order of a user in one query.
    ///
    /// Avoids a per-order item query when listing order history.
    pub async fn list_items_for_user(&self, user_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.product_name,
                   oi.quantity, oi.unit_price_cents, oi.subtotal_cents, oi.created_at
            FROM order_items oi
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ?1
            ORDER BY oi.created_at, oi.rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sets an order's status.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        order_id: &str,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }
}

// =============================================================================
// ID / Order Number Generation
// =============================================================================

/// Process-wide sequence feeding the order number suffix.
static ORDER_SEQ: AtomicU32 = AtomicU32::new(0);

/// Generates an order number in format: `ORD-<YYYYMMDDHHMMSS>-<user8>-<NNNN>`
///
/// ## Format
/// - YYYYMMDDHHMMSS: creation timestamp (UTC)
/// - user8: first 8 characters of the requesting user's id
/// - NNNN: process-wide sequence, padded to 4 digits
///
/// Timestamp + user alone collide when the same user orders twice within a
/// second; the sequence closes that window. The UNIQUE index on
/// `orders.order_number` is the final guard.
///
/// ## Example
/// `ORD-20260314093059-4fae22b1-0007`
pub fn generate_order_number(user_id: &str) -> String {
    let now = Utc::now();
    let user_part: String = user_id.chars().take(8).collect();
    let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed) % 10_000;

    format!("ORD-{}-{}-{:04}", now.format("%Y%m%d%H%M%S"), user_part, seq)
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
