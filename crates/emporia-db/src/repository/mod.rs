//! # Repository Module
//!
//! Database repository implementations for Emporia.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Service layer                                                          │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(id)                                    │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get_by_id(&self, id)            ← pool-backed single operations    │
//! │  ├── insert(&self, product)                                             │
//! │  └── fetch_by_id(conn, id)           ← connection-scoped, composable    │
//! │       │                                 inside one transaction          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One focused repository per entity instead of a generic CRUD base:
//! each repository owns exactly the queries its entity needs.
//!
//! Methods taking `&mut SqliteConnection` exist so a service can compose
//! several repositories inside a single `pool.begin()` transaction - the
//! order/stock flow commits order rows, stock updates and ledger entries
//! all-or-nothing.
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Account lookup and creation
//! - [`product::ProductRepository`] - Product CRUD, stock deltas, trending
//! - [`order::OrderRepository`] - Orders and line items
//! - [`stock::StockRepository`] - Append-only stock movement ledger

pub mod order;
pub mod product;
pub mod stock;
pub mod user;
