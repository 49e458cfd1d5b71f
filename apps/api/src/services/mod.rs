//! # Service Layer
//!
//! Business logic between the HTTP handlers and the repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Service Layer                                   │
//! │                                                                         │
//! │  Handler ──► Service ──► Repositories ──► SQLite                        │
//! │                 │                                                       │
//! │                 ├── validates input (emporia-core::validation)          │
//! │                 ├── enforces business rules (stock, state machine)      │
//! │                 └── owns transaction boundaries: the order and stock    │
//! │                     services open one transaction per operation and     │
//! │                     commit order rows, stock updates and ledger rows    │
//! │                     all-or-nothing                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod order_service;
pub mod product_service;
pub mod stock_service;
pub mod user_service;
