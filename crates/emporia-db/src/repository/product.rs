//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Atomic view counting for the trending ranking
//! - Guarded stock deltas for the order/stock transaction flow
//!
//! ## Stock Delta Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (lost updates under concurrency)             │
//! │     let s = SELECT current_stock ...;                                   │
//! │     UPDATE products SET current_stock = {s - 3} WHERE id = ?            │
//! │                                                                         │
//! │  ✅ CORRECT: guarded delta update                                       │
//! │     UPDATE products SET current_stock = current_stock - 3               │
//! │     WHERE id = ? AND current_stock - 3 >= 0                             │
//! │                                                                         │
//! │  Two concurrent checkouts of the last unit both pass a read check;      │
//! │  the guarded UPDATE lets exactly one of them through.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, category, sku, image_url, \
     views_count, sales_count, current_stock, minimum_stock, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_id("uuid-here").await?;
/// let trending = repo.get_trending(5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_by_id(&mut conn, id).await
    }

    /// Gets a product by its ID on an explicit connection.
    ///
    /// Used inside transactions so the read and the later stock write see
    /// the same database state.
    pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, category, sku, image_url,
                views_count, sales_count, current_stock, minimum_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.sku)
        .bind(&product.image_url)
        .bind(product.views_count)
        .bind(product.sales_count)
        .bind(product.current_stock)
        .bind(product.minimum_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's descriptive fields.
    ///
    /// Stock and the counters are deliberately not written here; stock only
    /// moves through [`Self::apply_stock_delta`] so the ledger stays complete.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                category = ?5,
                sku = ?6,
                image_url = ?7,
                minimum_stock = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.sku)
        .bind(&product.image_url)
        .bind(product.minimum_stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Atomically increments the view counter.
    ///
    /// A single in-database increment, never read-modify-write, so
    /// concurrent viewers can't lose updates.
    ///
    /// ## Returns
    /// `false` when no product with that id exists.
    pub async fn increment_views(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE products SET views_count = views_count + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Gets the most viewed active products, for the trending listing.
    pub async fn get_trending(&self, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY views_count DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a guarded stock delta (and a sales-counter delta) to a product.
    ///
    /// The guard `current_stock + delta >= 0` makes the decrement a
    /// compare-and-swap: of two concurrent checkouts racing for the last
    /// units, exactly one row update wins. Callers treat `false` as
    /// insufficient stock (the caller has already established the product
    /// exists).
    ///
    /// ## Arguments
    /// * `stock_delta` - change in stock (negative for sales/outbound)
    /// * `sales_delta` - change in units-sold counter (orders only, else 0)
    pub async fn apply_stock_delta(
        conn: &mut SqliteConnection,
        id: &str,
        stock_delta: i64,
        sales_delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, stock_delta = %stock_delta, "Applying stock delta");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                current_stock = current_stock + ?2,
                sales_count = sales_count + ?3,
                updated_at = ?4
            WHERE id = ?1 AND current_stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(stock_delta)
        .bind(sales_delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reads the current stock level on an explicit connection.
    ///
    /// Called right after [`Self::apply_stock_delta`] within the same
    /// transaction to derive the authoritative before/after snapshot for the
    /// movement ledger.
    pub async fn fetch_stock(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
        let stock = sqlx::query_scalar::<_, i64>(
            "SELECT current_stock FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(stock)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    fn sample_product(sku: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: format!("Product {sku}"),
            description: None,
            price_cents: 500,
            category: "misc".to_string(),
            sku: sku.to_string(),
            image_url: None,
            views_count: 0,
            sales_count: 0,
            current_stock: stock,
            minimum_stock: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("SKU-001", 10);
        repo.insert(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "SKU-001");
        assert_eq!(fetched.current_stock, 10);

        let by_sku = repo.get_by_sku("SKU-001").await.unwrap();
        assert_eq!(by_sku.unwrap().id, product.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("SKU-DUP", 1)).await.unwrap();
        let err = repo.insert(&sample_product("SKU-DUP", 1)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_delta_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("SKU-STK", 5);
        repo.insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        // 5 - 3 = 2: allowed
        let ok =
            ProductRepository::apply_stock_delta(&mut conn, &product.id, -3, 3, Utc::now())
                .await
                .unwrap();
        assert!(ok);
        assert_eq!(
            ProductRepository::fetch_stock(&mut conn, &product.id)
                .await
                .unwrap(),
            2
        );

        // 2 - 3 would go negative: guard refuses, stock untouched
        let ok =
            ProductRepository::apply_stock_delta(&mut conn, &product.id, -3, 3, Utc::now())
                .await
                .unwrap();
        assert!(!ok);
        assert_eq!(
            ProductRepository::fetch_stock(&mut conn, &product.id)
                .await
                .unwrap(),
            2
        );

        // release the only pooled connection before pool-backed reads
        drop(conn);

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.sales_count, 3);
    }

    #[tokio::test]
    async fn test_increment_views_and_trending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let quiet = sample_product("SKU-QUIET", 1);
        let popular = sample_product("SKU-POP", 1);
        repo.insert(&quiet).await.unwrap();
        repo.insert(&popular).await.unwrap();

        for _ in 0..3 {
            assert!(repo.increment_views(&popular.id).await.unwrap());
        }
        assert!(repo.increment_views(&quiet.id).await.unwrap());
        assert!(!repo.increment_views("missing").await.unwrap());

        let trending = repo.get_trending(5).await.unwrap();
        assert_eq!(trending[0].id, popular.id);
        assert_eq!(trending[0].views_count, 3);
        assert_eq!(trending[1].id, quiet.id);

        let top_one = repo.get_trending(1).await.unwrap();
        assert_eq!(top_one.len(), 1);
    }

    #[tokio::test]
    async fn test_update_descriptive_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut product = sample_product("SKU-UPD", 7);
        repo.insert(&product).await.unwrap();

        product.name = "Renamed".to_string();
        product.price_cents = 999;
        repo.update(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert_eq!(fetched.price_cents, 999);
        // stock untouched by descriptive updates
        assert_eq!(fetched.current_stock, 7);

        let ghost = sample_product("SKU-GHOST", 0);
        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
