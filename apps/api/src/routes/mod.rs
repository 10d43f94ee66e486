//! HTTP routes.
//!
//! Every handler follows the same shape:
//! ```text
//! extractors (auth, JSON, query) ──► validate ──► load ──► bites-core ──► persist ──► DTO
//! ```
//! Response DTOs carry money as JSON numbers in major units and use camelCase.

pub mod admin;
pub mod cart;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod payment;
pub mod products;

use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Serialize;
use ts_rs::TS;

use crate::AppState;

/// All API routes. State is attached by [`crate::build_router`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        // Cart
        .route("/api/cart", get(cart::view))
        .route("/api/cart/add", post(cart::add_item))
        .route("/api/cart/update", put(cart::update_item))
        .route("/api/cart/remove/{product_id}", delete(cart::remove_item))
        .route("/api/cart/clear", delete(cart::clear))
        // Checkout
        .route("/api/payment/create-intent", post(payment::create_intent))
        .route("/api/payment/verify", post(payment::verify))
        // Coupons
        .route("/api/coupons", get(coupons::list).post(coupons::create))
        .route("/api/coupons/apply", post(coupons::apply))
        .route("/api/coupons/{id}", delete(coupons::deactivate))
        // Orders
        .route("/api/orders/mine", get(orders::mine))
        .route("/api/orders/{id}", get(orders::get))
        .route("/api/admin/dashboard/stats", get(admin::dashboard_stats))
        .route("/api/admin/orders", get(admin::list_orders))
        .route("/api/admin/orders/{id}/status", put(admin::update_order_status))
        // Catalog
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
}

/// `{ success: true, message }`
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        MessageResponse {
            success: true,
            message: message.into(),
        }
    }
}
