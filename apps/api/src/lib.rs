//! # Emporia API
//!
//! HTTP surface of the Emporia e-commerce backend.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET   /health                        public   liveness + db ping       │
//! │  POST  /api/v1/users                  public   register account         │
//! │  POST  /api/v1/login/access-token     public   issue bearer token       │
//! │  POST  /api/v1/products               admin    create product           │
//! │  GET   /api/v1/products/trending      public   top products by views    │
//! │  GET   /api/v1/products/{id}          public   fetch (counts the view)  │
//! │  PATCH /api/v1/products/{id}          admin    partial update           │
//! │  POST  /api/v1/stock                  admin    register stock movement  │
//! │  GET   /api/v1/stock/product/{id}     public   movement history         │
//! │  POST  /api/v1/orders                 user     place order              │
//! │  GET   /api/v1/orders                 user     own orders               │
//! │  PATCH /api/v1/orders/{id}/status     admin    advance/cancel order     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the axum application router with all routes and shared state.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/users", post(routes::users::create))
        .route(
            "/api/v1/login/access-token",
            post(routes::login::access_token),
        )
        .route("/api/v1/products", post(routes::products::create))
        .route("/api/v1/products/trending", get(routes::products::trending))
        .route(
            "/api/v1/products/{id}",
            get(routes::products::get_by_id).patch(routes::products::update),
        )
        .route("/api/v1/stock", post(routes::stock::register))
        .route(
            "/api/v1/stock/product/{id}",
            get(routes::stock::product_movements),
        )
        .route(
            "/api/v1/orders",
            post(routes::orders::create).get(routes::orders::list_mine),
        )
        .route(
            "/api/v1/orders/{id}/status",
            patch(routes::orders::update_status),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
