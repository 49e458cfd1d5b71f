//! Shared application state.
//!
//! Built once at startup from an explicit config and database handle, then
//! cloned into every handler by axum. Services are constructed up front;
//! each is a thin, cloneable wrapper around the pooled database.

use std::sync::Arc;

use emporia_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::services::order_service::OrderService;
use crate::services::product_service::ProductService;
use crate::services::stock_service::StockService;
use crate::services::user_service::UserService;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub users: UserService,
    pub products: ProductService,
    pub stock: StockService,
    pub orders: OrderService,
}

impl AppState {
    /// Wires up services against the given database and config.
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.access_token_lifetime_secs(),
        ));

        AppState {
            users: UserService::new(db.clone()),
            products: ProductService::new(db.clone()),
            stock: StockService::new(db.clone(), config.transaction_timeout()),
            orders: OrderService::new(db.clone(), config.transaction_timeout()),
            jwt,
            db,
        }
    }
}
