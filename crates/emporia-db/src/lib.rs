//! # emporia-db: Database Layer for Emporia
//!
//! This crate provides database access for the Emporia backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporia Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /orders)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Service layer (order transaction, stock registration)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     emporia-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ (user/product │    │  (embedded)  │   │   │
//! │  │   │               │    │  order/stock) │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│  one focused  │    │ 001_init.sql │   │   │
//! │  │   │ Transactions  │    │  repo per     │    │              │   │   │
//! │  │   │               │    │  entity       │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (WAL)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (user, product, order, stock)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporia_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/emporia.db")).await?;
//! let product = db.products().get_by_id("uuid").await?;
//!
//! // Transactions spanning repositories:
//! let mut tx = db.pool().begin().await?;
//! // ... repository calls taking &mut SqliteConnection ...
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::stock::StockRepository;
pub use repository::user::UserRepository;
