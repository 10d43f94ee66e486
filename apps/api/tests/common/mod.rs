//! Shared harness for the HTTP tests: an in-memory database behind the full
//! router, driven one request at a time with `oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use bites_api::{build_router, ApiConfig, AppState, Role};
use bites_core::coupon::NewCoupon;
use bites_core::{Coupon, DiscountType, Money, Product};
use bites_db::{Database, DbConfig};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        TestApp::with_config(ApiConfig::for_tests()).await
    }

    pub async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(config, db);
        TestApp {
            app: build_router(state.clone()),
            state,
        }
    }

    pub fn token(&self, user_id: &str, role: Role) -> String {
        self.state.jwt.generate_access_token(user_id, role).unwrap()
    }

    pub fn user_token(&self, user_id: &str) -> String {
        self.token(user_id, Role::User)
    }

    pub fn admin_token(&self) -> String {
        self.token("admin-1", Role::Admin)
    }

    /// Sends a request and returns the status and parsed JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Inserts an active product directly through the repository.
    pub async fn product(&self, name: &str, price_minor: i64, stock: i64) -> Product {
        let now = Utc::now();
        let sku = format!("T-{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase();
        self.state
            .db
            .products()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                sku,
                name: name.to_string(),
                description: None,
                price: Money::from_minor(price_minor),
                stock,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    /// Inserts a live percentage coupon (`pct` whole percent).
    pub async fn percent_coupon(&self, code: &str, pct: i64, cap_minor: Option<i64>) -> Coupon {
        let now = Utc::now();
        let mut input = NewCoupon {
            code: code.to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: pct * 100,
            min_order_value: Money::zero(),
            max_discount: cap_minor.map(Money::from_minor),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            max_uses: None,
            is_active: true,
        };
        input.validate().unwrap();
        self.state.db.coupons().insert(&input).await.unwrap()
    }

    pub async fn add_to_cart(&self, token: &str, product_id: &str, quantity: i64) -> (StatusCode, Value) {
        self.post(
            "/api/cart/add",
            token,
            json!({ "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    pub async fn create_intent(&self, token: &str, coupon_code: Option<&str>) -> (StatusCode, Value) {
        self.post(
            "/api/payment/create-intent",
            token,
            json!({
                "paymentMethod": "upi",
                "shippingAddress": shipping_address(),
                "couponCode": coupon_code,
            }),
        )
        .await
    }
}

pub fn shipping_address() -> Value {
    json!({
        "fullName": "Asha Rao",
        "phone": "+91 98450 12345",
        "line1": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postalCode": "560001",
        "country": "India",
    })
}
