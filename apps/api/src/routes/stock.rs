//! Stock movement endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use emporia_core::{StockMovement, StockMovementType};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::services::stock_service::NewMovement;
use crate::state::AppState;

/// Ledger entry as exposed through the API.
#[derive(Debug, Serialize)]
pub struct StockMovementResponse {
    pub id: String,
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub order_id: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StockMovement> for StockMovementResponse {
    fn from(movement: StockMovement) -> Self {
        StockMovementResponse {
            id: movement.id,
            product_id: movement.product_id,
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            stock_before: movement.stock_before,
            stock_after: movement.stock_after,
            order_id: movement.order_id,
            reason: movement.reason,
            notes: movement.notes,
            created_at: movement.created_at,
        }
    }
}

/// POST /stock - register a stock movement. Admin only.
pub async fn register(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(new_movement): Json<NewMovement>,
) -> Result<(StatusCode, Json<StockMovementResponse>), ApiError> {
    let movement = state.stock.register_movement(&admin.id, new_movement).await?;
    Ok((StatusCode::CREATED, Json(movement.into())))
}

/// GET /stock/product/{id} - a product's movement history, newest first.
/// Public.
pub async fn product_movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StockMovementResponse>>, ApiError> {
    let movements = state.stock.get_product_movements(&id).await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}
