//! # 18 Bites API
//!
//! REST server for the storefront checkout and the admin console.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Routes                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/cart     │  │  /api/payment  │  │  /api/coupons              ││
//! │  │                │  │                │  │                            ││
//! │  │ • view / add   │  │ • create-intent│  │ • apply (preview)          ││
//! │  │ • update       │  │ • verify       │  │ • list / create  (admin)   ││
//! │  │ • remove/clear │  │                │  │ • deactivate     (admin)   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/orders   │  │  /api/admin    │  │  /api/products             ││
//! │  │                │  │                │  │                            ││
//! │  │ • mine         │  │ • orders       │  │ • list / get     (public)  ││
//! │  │ • by id        │  │ • status       │  │ • create/update  (admin)   ││
//! │  │                │  │ • dashboard    │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      AppState                                    │  │
//! │  │  Database (bites-db)   JwtManager   PaymentGateway   ApiConfig   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing decisions are made in `bites-core`; handlers load inputs,
//! call into the core and persist the result.

pub mod auth;
pub mod config;
pub mod error;
pub mod payment;
pub mod routes;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use bites_db::Database;

// Re-exports
pub use auth::{AdminUser, CurrentUser, JwtManager, Role};
pub use config::{ApiConfig, ConfigError, LogFormat};
pub use error::{ApiError, ApiResult};
pub use payment::PaymentGateway;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub gateway: Arc<PaymentGateway>,
}

impl AppState {
    /// Wires the state from a loaded config and an open database.
    pub fn new(config: ApiConfig, db: Database) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_access_lifetime_secs);
        let gateway = PaymentGateway::new(config.payment_key_secret.clone());

        AppState {
            db,
            jwt: Arc::new(jwt),
            gateway: Arc::new(gateway),
            config: Arc::new(config),
        }
    }
}

/// Builds the full router with tracing and optional CORS.
pub fn build_router(state: AppState) -> Router {
    let cors_origin = state.config.cors_allow_origin.clone();
    let app = routes::router().layer(TraceLayer::new_for_http());

    let app = match cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        ),
        Some(Err(_)) => {
            warn!(origin = ?cors_origin, "Ignoring invalid CORS_ALLOW_ORIGIN");
            app
        }
        None => app,
    };

    app.with_state(state)
}
