//! Order endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporia_core::{OrderDetail, OrderStatus};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiError;
use crate::services::order_service::NewOrder;
use crate::state::AppState;

/// Line item as exposed through the API, with the resolved product name.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Order as exposed through the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        let OrderDetail { order, items } = detail;
        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            status: order.status,
            subtotal_cents: order.subtotal_cents,
            tax_cents: order.tax_cents,
            shipping_cost_cents: order.shipping_cost_cents,
            total_cents: order.total_cents,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    subtotal_cents: item.subtotal_cents,
                })
                .collect(),
            shipping_address: order.shipping_address,
            shipping_city: order.shipping_city,
        }
    }
}

/// Requested status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// POST /orders - place an order. Any authenticated user.
///
/// The backend computes unit prices, subtotals and the total from the
/// database, validates stock, and records one ledger row per line -
/// all in a single transaction.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(new_order): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let detail = state.orders.create_order(&user.id, new_order).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// GET /orders - the authenticated user's own orders, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_user_orders(&user.id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// PATCH /orders/{id}/status - advance or cancel an order. Admin only.
///
/// Cancelling a not-yet-delivered order returns every line's stock and
/// appends matching INBOUND ledger rows atomically with the status write.
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(status_update): Json<StatusUpdate>,
) -> Result<Json<OrderResponse>, ApiError> {
    let detail = state.orders.update_status(&id, status_update.status).await?;
    Ok(Json(detail.into()))
}
