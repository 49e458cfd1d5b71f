//! Integration tests for the API server.
//!
//! Each test gets its own in-memory database; requests are driven straight
//! through the router with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use emporia_api::config::ApiConfig;
use emporia_api::security::hash_password;
use emporia_api::services::product_service::NewProduct;
use emporia_api::state::AppState;
use emporia_core::{User, UserRole};
use emporia_db::{Database, DbConfig};

// =============================================================================
// Harness
// =============================================================================

async fn setup() -> (axum::Router, AppState) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        jwt_secret: "integration-test-secret".to_string(),
        ..ApiConfig::default()
    };
    let state = AppState::new(db, &config);
    let app = emporia_api::create_app(state.clone());
    (app, state)
}

/// Inserts an account directly and returns (user_id, bearer token).
async fn seed_account(state: &AppState, role: UserRole) -> (String, String) {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: format!("{}@example.com", Uuid::new_v4()),
        username: Uuid::new_v4().to_string(),
        hashed_password: hash_password("password123").unwrap(),
        full_name: None,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.users().insert(&user).await.unwrap();
    let token = state.jwt.generate_access_token(&user.id).unwrap();
    (user.id, token)
}

/// Creates a product through the service and returns its id.
async fn seed_product(state: &AppState, price_cents: i64, stock: i64) -> String {
    let product = state
        .products
        .create_product(NewProduct {
            name: format!("Product {}", Uuid::new_v4()),
            description: None,
            price_cents,
            category: "test".to_string(),
            sku: Uuid::new_v4().to_string().replace('-', ""),
            image_url: None,
            current_stock: stock,
            minimum_stock: 10,
        })
        .await
        .unwrap();
    product.id
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn request_json(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn current_stock(state: &AppState, product_id: &str) -> i64 {
    state
        .db
        .products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .current_stock
}

// =============================================================================
// Health / auth basics
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "up");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let (app, _) = setup().await;

    let payload = serde_json::json!({
        "email": "shopper@example.com",
        "username": "shopper",
        "password": "password123",
        "full_name": "Sam Shopper"
    });

    let response = app
        .clone()
        .oneshot(request_json("POST", "/api/v1/users", None, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["email"], "shopper@example.com");
    assert_eq!(json["role"], "customer");
    assert!(json.get("hashed_password").is_none());

    // Same email again: rejected
    let response = app
        .clone()
        .oneshot(request_json("POST", "/api/v1/users", None, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Login with the right password
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login/access-token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=shopper@example.com&password=password123",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert!(json["access_token"].as_str().unwrap().contains('.'));

    // Wrong password: 401
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login/access-token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=shopper@example.com&password=nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orders_require_auth() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/api/v1/orders", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Order / stock transaction flow
// =============================================================================

#[tokio::test]
async fn test_order_create_then_cancel_restores_stock() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;

    // Product with stock=10, price=$5.00
    let product_id = seed_product(&state, 500, 10).await;

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({
                "items": [{ "product_id": product_id, "quantity": 3 }],
                "shipping_address": "123 Main St",
                "shipping_city": "Springfield"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let order_id = json["id"].as_str().unwrap().to_string();
    assert!(json["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(json["status"], "pending");
    assert_eq!(json["subtotal_cents"], 1500);
    assert_eq!(json["tax_cents"], 0);
    assert_eq!(json["shipping_cost_cents"], 0);
    assert_eq!(json["total_cents"], 1500);
    assert_eq!(json["items"][0]["quantity"], 3);
    assert_eq!(json["items"][0]["unit_price_cents"], 500);
    assert_eq!(json["items"][0]["subtotal_cents"], 1500);
    assert!(json["items"][0]["product_name"]
        .as_str()
        .unwrap()
        .starts_with("Product "));

    // Stock decremented, one OUTBOUND movement bracketing 10 -> 7
    assert_eq!(current_stock(&state, &product_id).await, 7);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/stock/product/{product_id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let movements = body_json(response).await;
    assert_eq!(movements.as_array().unwrap().len(), 1);
    assert_eq!(movements[0]["movement_type"], "outbound");
    assert_eq!(movements[0]["quantity"], 3);
    assert_eq!(movements[0]["stock_before"], 10);
    assert_eq!(movements[0]["stock_after"], 7);
    assert_eq!(movements[0]["order_id"].as_str().unwrap(), order_id);

    let product = state
        .db
        .products()
        .get_by_id(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.sales_count, 3);

    // Cancel: stock returns to 10 with one additional INBOUND movement
    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &format!("/api/v1/orders/{order_id}/status"),
            Some(&admin_token),
            &serde_json::json!({ "status": "cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "cancelled");

    assert_eq!(current_stock(&state, &product_id).await, 10);

    let response = app
        .oneshot(get(&format!("/api/v1/stock/product/{product_id}"), None))
        .await
        .unwrap();
    let movements = body_json(response).await;
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    // newest first
    assert_eq!(movements[0]["movement_type"], "inbound");
    assert_eq!(movements[0]["quantity"], 3);
    assert_eq!(movements[0]["stock_before"], 7);
    assert_eq!(movements[0]["stock_after"], 10);

    let product = state
        .db
        .products()
        .get_by_id(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.sales_count, 0);
}

#[tokio::test]
async fn test_insufficient_stock_rejects_and_leaves_no_trace() {
    let (app, state) = setup().await;
    let (user_id, token) = seed_account(&state, UserRole::Customer).await;

    // stock=2, order 5: rejected outright
    let product_id = seed_product(&state, 500, 2).await;

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({
                "items": [{ "product_id": product_id, "quantity": 5 }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("Insufficient stock"));
    assert!(message.contains("available 2"));
    assert!(message.contains("requested 5"));

    // Nothing changed: stock, ledger and orders are untouched
    assert_eq!(current_stock(&state, &product_id).await, 2);
    assert_eq!(state.db.stock_movements().count().await.unwrap(), 0);
    assert!(state.orders.list_user_orders(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_product_rolls_back_prior_lines() {
    let (app, state) = setup().await;
    let (user_id, token) = seed_account(&state, UserRole::Customer).await;

    let product_id = seed_product(&state, 500, 10).await;

    // First line is fulfillable; the second references a missing product.
    // The whole order must abort, including the first line's decrement.
    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({
                "items": [
                    { "product_id": product_id, "quantity": 3 },
                    { "product_id": "does-not-exist", "quantity": 1 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(current_stock(&state, &product_id).await, 10);
    assert_eq!(state.db.stock_movements().count().await.unwrap(), 0);
    assert!(state.orders.list_user_orders(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_rejects_non_positive_quantity() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;
    let product_id = seed_product(&state, 500, 10).await;

    for bad_quantity in [0, -2] {
        let response = app
            .clone()
            .oneshot(request_json(
                "POST",
                "/api/v1/orders",
                Some(&token),
                &serde_json::json!({
                    "items": [{ "product_id": product_id, "quantity": bad_quantity }]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Empty orders are rejected too
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({ "items": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(current_stock(&state, &product_id).await, 10);
}

// The reference system documented a linear state machine but accepted any
// transition; this implementation enforces it strictly and answers 409.
#[tokio::test]
async fn test_status_state_machine_enforced() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;
    let product_id = seed_product(&state, 500, 10).await;

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({ "items": [{ "product_id": product_id, "quantity": 3 }] }),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/v1/orders/{order_id}/status");

    // Skipping straight to delivered: rejected
    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &status_uri,
            Some(&admin_token),
            &serde_json::json!({ "status": "delivered" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The documented forward path works
    for next in ["confirmed", "shipped", "delivered"] {
        let response = app
            .clone()
            .oneshot(request_json(
                "PATCH",
                &status_uri,
                Some(&admin_token),
                &serde_json::json!({ "status": next }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "transition to {next}");
    }

    // Delivered is terminal: cancelling answers 409 and stock stays sold
    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &status_uri,
            Some(&admin_token),
            &serde_json::json!({ "status": "cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(current_stock(&state, &product_id).await, 7);

    // Unknown order: 404
    let response = app
        .oneshot(request_json(
            "PATCH",
            "/api/v1/orders/missing/status",
            Some(&admin_token),
            &serde_json::json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_after_confirm_and_ship_restores_stock() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;
    let product_id = seed_product(&state, 250, 8).await;

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({ "items": [{ "product_id": product_id, "quantity": 2 }] }),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/v1/orders/{order_id}/status");

    for next in ["confirmed", "shipped"] {
        let response = app
            .clone()
            .oneshot(request_json(
                "PATCH",
                &status_uri,
                Some(&admin_token),
                &serde_json::json!({ "status": next }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(current_stock(&state, &product_id).await, 6);

    // Cancelling a shipped order still returns the goods
    let response = app
        .oneshot(request_json(
            "PATCH",
            &status_uri,
            Some(&admin_token),
            &serde_json::json!({ "status": "cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(current_stock(&state, &product_id).await, 8);
}

#[tokio::test]
async fn test_multi_line_order_totals_and_ledger() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;

    let cheap = seed_product(&state, 250, 10).await;
    let pricey = seed_product(&state, 1000, 4).await;

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({
                "items": [
                    { "product_id": cheap, "quantity": 4 },
                    { "product_id": pricey, "quantity": 2 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    // 4 × $2.50 + 2 × $10.00 = $30.00
    assert_eq!(json["subtotal_cents"], 3000);
    assert_eq!(json["total_cents"], 3000);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // request order preserved
    assert_eq!(items[0]["product_id"].as_str().unwrap(), cheap);
    assert_eq!(items[1]["product_id"].as_str().unwrap(), pricey);

    assert_eq!(current_stock(&state, &cheap).await, 6);
    assert_eq!(current_stock(&state, &pricey).await, 2);
    // one ledger row per line
    assert_eq!(state.db.stock_movements().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_list_orders_shows_only_own() {
    let (app, state) = setup().await;
    let (_first_id, first_token) = seed_account(&state, UserRole::Customer).await;
    let (_second_id, second_token) = seed_account(&state, UserRole::Customer).await;
    let product_id = seed_product(&state, 500, 20).await;

    for token in [&first_token, &second_token] {
        let response = app
            .clone()
            .oneshot(request_json(
                "POST",
                "/api/v1/orders",
                Some(token),
                &serde_json::json!({ "items": [{ "product_id": product_id, "quantity": 1 }] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get("/api/v1/orders", Some(&first_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_order_reads_are_idempotent() {
    let (app, state) = setup().await;
    let (_user_id, token) = seed_account(&state, UserRole::Customer).await;
    let product_id = seed_product(&state, 750, 5).await;

    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/orders",
            Some(&token),
            &serde_json::json!({ "items": [{ "product_id": product_id, "quantity": 2 }] }),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let first = state.orders.get_order(&order_id).await.unwrap().unwrap();
    let second = state.orders.get_order(&order_id).await.unwrap().unwrap();

    assert_eq!(first.order.total(), second.order.total());
    assert_eq!(first.items.len(), second.items.len());
    assert_eq!(first.items[0].subtotal(), second.items[0].subtotal());
}

#[tokio::test]
async fn test_concurrent_orders_for_last_unit_serialize() {
    let (_app, state) = setup().await;
    let (user_id, _token) = seed_account(&state, UserRole::Customer).await;
    let product_id = seed_product(&state, 500, 1).await;

    let order_for_last_unit = || {
        state.orders.create_order(
            &user_id,
            emporia_api::services::order_service::NewOrder {
                items: vec![emporia_api::services::order_service::OrderLine {
                    product_id: product_id.clone(),
                    quantity: 1,
                }],
                shipping_address: None,
                shipping_city: None,
                shipping_postal_code: None,
                notes: None,
            },
        )
    };

    let (first, second) = tokio::join!(order_for_last_unit(), order_for_last_unit());

    // Exactly one wins the last unit; stock never goes negative
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    assert_eq!(current_stock(&state, &product_id).await, 0);
    assert_eq!(state.db.stock_movements().count().await.unwrap(), 1);
}

// =============================================================================
// Standalone stock movement registration
// =============================================================================

#[tokio::test]
async fn test_register_movement_flow() {
    let (app, state) = setup().await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;
    let (_user_id, user_token) = seed_account(&state, UserRole::Customer).await;
    let product_id = seed_product(&state, 500, 10).await;

    // Inbound receipt: 10 -> 15
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/stock",
            Some(&admin_token),
            &serde_json::json!({
                "product_id": product_id,
                "movement_type": "inbound",
                "quantity": 5,
                "reason": "Supplier delivery"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["stock_before"], 10);
    assert_eq!(json["stock_after"], 15);

    // Outbound beyond stock: rejected, nothing recorded
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/stock",
            Some(&admin_token),
            &serde_json::json!({
                "product_id": product_id,
                "movement_type": "outbound",
                "quantity": 99
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(current_stock(&state, &product_id).await, 15);

    // Adjustment adds in the current design (quantity is always positive)
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/stock",
            Some(&admin_token),
            &serde_json::json!({
                "product_id": product_id,
                "movement_type": "adjustment",
                "quantity": 2,
                "notes": "Found during recount"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(current_stock(&state, &product_id).await, 17);

    // Unknown product: 404
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/stock",
            Some(&admin_token),
            &serde_json::json!({
                "product_id": "missing",
                "movement_type": "inbound",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Customers may not register movements
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/stock",
            Some(&user_token),
            &serde_json::json!({
                "product_id": product_id,
                "movement_type": "inbound",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // History is newest first and complete
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/stock/product/{product_id}"), None))
        .await
        .unwrap();
    let movements = body_json(response).await;
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["movement_type"], "adjustment");
    assert_eq!(movements[1]["movement_type"], "inbound");

    // History of a missing product: 404
    let response = app
        .oneshot(get("/api/v1/stock/product/missing", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_create_requires_admin_and_unique_sku() {
    let (app, state) = setup().await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;
    let (_user_id, user_token) = seed_account(&state, UserRole::Customer).await;

    let payload = serde_json::json!({
        "name": "Coffee Beans 1kg",
        "price_cents": 1850,
        "category": "groceries",
        "sku": "COF-1000",
        "current_stock": 25
    });

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/products",
            Some(&admin_token),
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["sku"], "COF-1000");
    assert_eq!(json["current_stock"], 25);
    assert_eq!(json["minimum_stock"], 10);
    assert_eq!(json["views_count"], 0);

    // Duplicate SKU: 400
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/products",
            Some(&admin_token),
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Customer: 403; anonymous: 401
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/products",
            Some(&user_token),
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request_json("POST", "/api/v1/products", None, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_views_and_trending() {
    let (app, state) = setup().await;

    let quiet = seed_product(&state, 100, 1).await;
    let popular = seed_product(&state, 100, 1).await;

    // Each GET bumps the view counter; the response reflects the bump
    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/products/{popular}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["views_count"], expected);
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/products/{quiet}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/v1/products/trending?limit=2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let trending = json.as_array().unwrap();
    assert_eq!(trending.len(), 2);
    assert_eq!(trending[0]["id"].as_str().unwrap(), popular);
    assert_eq!(trending[1]["id"].as_str().unwrap(), quiet);

    // Missing product: 404, and no phantom view rows
    let response = app
        .oneshot(get("/api/v1/products/missing", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_partial_update() {
    let (app, state) = setup().await;
    let (_admin_id, admin_token) = seed_account(&state, UserRole::Admin).await;

    let product = state
        .products
        .create_product(NewProduct {
            name: "Original".to_string(),
            description: Some("Keep or clear me".to_string()),
            price_cents: 1000,
            category: "misc".to_string(),
            sku: "UPD-1".to_string(),
            image_url: None,
            current_stock: 5,
            minimum_stock: 10,
        })
        .await
        .unwrap();

    // Only the price: everything else stays
    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &format!("/api/v1/products/{}", product.id),
            Some(&admin_token),
            &serde_json::json!({ "price_cents": 1250 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["price_cents"], 1250);
    assert_eq!(json["name"], "Original");
    assert_eq!(json["description"], "Keep or clear me");
    assert_eq!(json["current_stock"], 5);

    // Explicit null clears a nullable field
    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &format!("/api/v1/products/{}", product.id),
            Some(&admin_token),
            &serde_json::json!({ "description": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["description"].is_null());

    // Changing SKU onto an existing one: 400
    let other = state
        .products
        .create_product(NewProduct {
            name: "Other".to_string(),
            description: None,
            price_cents: 100,
            category: "misc".to_string(),
            sku: "UPD-2".to_string(),
            image_url: None,
            current_stock: 0,
            minimum_stock: 10,
        })
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request_json(
            "PATCH",
            &format!("/api/v1/products/{}", other.id),
            Some(&admin_token),
            &serde_json::json!({ "sku": "UPD-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing product: 404
    let response = app
        .oneshot(request_json(
            "PATCH",
            "/api/v1/products/missing",
            Some(&admin_token),
            &serde_json::json!({ "price_cents": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
