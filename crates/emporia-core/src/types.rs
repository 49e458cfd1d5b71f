//! # Domain Types
//!
//! Core domain types used throughout Emporia.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  order_number   │   │  movement_type  │       │
//! │  │  price_cents    │   │  status         │   │  stock_before   │       │
//! │  │  current_stock  │   │  total_cents    │   │  stock_after    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Order ──owns──► OrderItem (price + name frozen at purchase time)      │
//! │  StockMovement is append-only: the stock audit trail                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where applicable: (sku, order_number, email) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// User
// =============================================================================

/// Role attached to a user account.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can manage products, stock and order statuses.
    Admin,
    /// Regular shopper; can place and list their own orders.
    Customer,
}

impl UserRole {
    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Login identity; unique.
    pub email: String,
    /// Display handle; unique.
    pub username: String,
    /// Argon2 password hash. Never exposed through the API.
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in listings and frozen onto order items.
    pub name: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    pub category: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    pub image_url: Option<String>,

    /// Detail-page view counter, drives the trending ranking.
    pub views_count: i64,

    /// Units sold through orders (net of cancellations).
    pub sales_count: i64,

    /// Current stock level. Mutated only through ledger-producing
    /// operations: order creation/cancellation and movement registration.
    pub current_stock: i64,

    /// Reorder threshold for low-stock reporting.
    pub minimum_stock: i64,

    /// Whether product is listed (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    /// Checks whether stock has fallen below the reorder threshold.
    #[inline]
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock < self.minimum_stock
    }
}

/// Partial update for a product.
///
/// Distinguishes three states per field:
/// - absent from the payload → `None` → leave the stored value alone
/// - present with a value → `Some(..)` → overwrite
/// - present as `null` (nullable fields only) → `Some(None)` → clear
///
/// `current_stock` is deliberately NOT here: stock only changes through
/// stock movements so the audit trail stays complete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub minimum_stock: Option<i64>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Applies the set fields onto `product`, leaving unset fields alone.
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price_cents) = self.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = image_url.clone();
        }
        if let Some(minimum_stock) = self.minimum_stock {
            product.minimum_stock = minimum_stock;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
    }

    /// True when no field is set (nothing to write).
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.category.is_none()
            && self.sku.is_none()
            && self.image_url.is_none()
            && self.minimum_stock.is_none()
            && self.is_active.is_none()
    }
}

/// Deserializes `Option<T>` wrapped in an outer `Some`, so that a field
/// present as JSON `null` becomes `Some(None)` while an absent field stays
/// `None` (via `#[serde(default)]`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// =============================================================================
// Order Status State Machine
// =============================================================================

/// The lifecycle status of an order.
///
/// ```text
/// PENDING ──► CONFIRMED ──► SHIPPED ──► DELIVERED (terminal)
///    │            │            │
///    └────────────┴────────────┴──────► CANCELLED (terminal)
/// ```
///
/// Transitions only move forward or to `Cancelled`; `Delivered` and
/// `Cancelled` accept no further transitions.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Checks whether the order accepts no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Checks whether moving from `self` to `next` is permitted.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
        )
    }

    /// Validates a transition, returning a typed error when rejected.
    pub fn ensure_transition_to(&self, next: OrderStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Lowercase wire/storage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// Totals are computed once at creation time and never recomputed; the
/// invariant `total = subtotal + tax + shipping_cost` holds for every
/// persisted row. Tax and shipping are reserved fields, currently zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Human-readable business identifier, unique.
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of purchase (frozen).
    pub product_name: String,
    /// Units ordered; always positive.
    pub quantity: i64,
    /// Unit price in cents at time of purchase (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price, in cents.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// An order together with its line items, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Direction of a stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMovementType {
    /// Goods received; adds to stock.
    Inbound,
    /// Goods leaving (sale or manual issue); subtracts from stock.
    Outbound,
    /// Manual correction. Quantity is constrained positive, so an
    /// adjustment always adds to stock in the current design.
    Adjustment,
}

impl StockMovementType {
    /// Signed stock delta for a positive movement quantity.
    #[inline]
    pub const fn signed_delta(&self, quantity: i64) -> i64 {
        match self {
            StockMovementType::Inbound | StockMovementType::Adjustment => quantity,
            StockMovementType::Outbound => -quantity,
        }
    }
}

/// One entry in the append-only stock ledger.
///
/// `stock_before` and `stock_after` snapshot the product's stock around the
/// change: `stock_after == stock_before + signed_delta(quantity)`. Rows are
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: StockMovementType,
    /// Magnitude of the change; always positive.
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    /// Set when the movement was caused by an order (sale or cancellation).
    pub order_id: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Admin who registered a manual movement; None for order-driven rows.
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
