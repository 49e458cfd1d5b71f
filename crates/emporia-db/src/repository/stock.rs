//! # Stock Movement Repository
//!
//! Database operations for the append-only stock ledger.
//!
//! ## Append-Only Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stock Ledger                                       │
//! │                                                                         │
//! │  Every change to products.current_stock writes exactly one row here,   │
//! │  in the same transaction as the stock update:                           │
//! │                                                                         │
//! │  order created    → OUTBOUND  (before=10, after=7,  order_id set)       │
//! │  order cancelled  → INBOUND   (before=7,  after=10, order_id set)       │
//! │  goods received   → INBOUND   (registered by an admin)                  │
//! │  manual correction→ ADJUSTMENT                                          │
//! │                                                                         │
//! │  Rows are never updated or deleted: this table is the audit trail.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use emporia_core::StockMovement;

const MOVEMENT_COLUMNS: &str = "id, product_id, movement_type, quantity, stock_before, \
     stock_after, order_id, reason, notes, performed_by, created_at";

/// Repository for stock movement database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Appends a movement to the ledger.
    ///
    /// Connection-scoped: always called inside the transaction that also
    /// updates the product's stock, so ledger and stock commit together.
    pub async fn insert_movement(
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        debug!(
            product_id = %movement.product_id,
            movement_type = ?movement.movement_type,
            quantity = %movement.quantity,
            "Appending stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, movement_type, quantity,
                stock_before, stock_after, order_id,
                reason, notes, performed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&movement.order_id)
        .bind(&movement.reason)
        .bind(&movement.notes)
        .bind(&movement.performed_by)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a product's movement history, newest first.
    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts all ledger rows (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new stock movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::{Duration, Utc};
    use emporia_core::{Product, StockMovementType};

    async fn seed_product(db: &Database) -> String {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: "Ledgered".to_string(),
            description: None,
            price_cents: 100,
            category: "misc".to_string(),
            sku: "SKU-LEDGER".to_string(),
            image_url: None,
            views_count: 0,
            sales_count: 0,
            current_stock: 10,
            minimum_stock: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product.id
    }

    fn movement(
        product_id: &str,
        movement_type: StockMovementType,
        quantity: i64,
        before: i64,
        created_at: chrono::DateTime<Utc>,
    ) -> StockMovement {
        StockMovement {
            id: generate_movement_id(),
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            stock_before: before,
            stock_after: before + movement_type.signed_delta(quantity),
            order_id: None,
            reason: Some("Restock".to_string()),
            notes: None,
            performed_by: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product_id = seed_product(&db).await;
        let repo = db.stock_movements();

        let earlier = Utc::now() - Duration::seconds(60);
        let later = Utc::now();

        let old = movement(&product_id, StockMovementType::Inbound, 5, 10, earlier);
        let new = movement(&product_id, StockMovementType::Outbound, 3, 15, later);

        let mut tx = db.pool().begin().await.unwrap();
        StockRepository::insert_movement(&mut tx, &old).await.unwrap();
        StockRepository::insert_movement(&mut tx, &new).await.unwrap();
        tx.commit().await.unwrap();

        let history = repo.list_by_product(&product_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, new.id);
        assert_eq!(history[0].stock_before, 15);
        assert_eq!(history[0].stock_after, 12);
        assert_eq!(history[1].id, old.id);
        assert_eq!(history[1].stock_after, 15);

        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.list_by_product("missing").await.unwrap().is_empty());
    }
}
