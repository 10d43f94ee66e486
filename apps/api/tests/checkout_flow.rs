//! Shopper journey over HTTP: cart, payment intent, verification.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use bites_api::ApiConfig;
use bites_core::PaymentStatus;
use common::TestApp;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_cart_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = app.get("/api/cart", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_cart_view() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");

    let (status, body) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["cart"]["totalPrice"], 0.0);
}

#[tokio::test]
async fn test_cart_add_update_remove() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let ragi = app.product("Ragi Chips", 9_900, 10).await;
    let jowar = app.product("Jowar Puffs", 14_950, 10).await;

    let (status, body) = app.add_to_cart(&token, &ragi.id, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["totalPrice"], 198.0);
    assert_eq!(body["cart"]["items"][0]["name"], "Ragi Chips");

    // same product again merges into one line
    app.add_to_cart(&token, &ragi.id, 1).await;
    let (_, body) = app.add_to_cart(&token, &jowar.id, 1).await;
    let items = body["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(body["cart"]["totalPrice"], 446.5);

    let (status, body) = app
        .put(
            "/api/cart/update",
            &token,
            json!({ "productId": ragi.id, "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"]["totalPrice"], 149.5);

    let (status, body) = app
        .delete(&format!("/api/cart/remove/{}", jowar.id), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["totalPrice"], 0.0);
}

#[tokio::test]
async fn test_cart_rejections() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let product = app.product("Foxtail Mix", 5_000, 1).await;

    // stock 1, quantity 2
    let (status, body) = app.add_to_cart(&token, &product.id, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Insufficient stock"));

    let (_, body) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 0);

    let missing = uuid::Uuid::new_v4().to_string();
    let (status, body) = app.add_to_cart(&token, &missing, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = app.add_to_cart(&token, "not-a-uuid", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.add_to_cart(&token, &product.id, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.add_to_cart(&token, &product.id, 1).await;
    let (status, body) = app
        .put(
            "/api/cart/update",
            &token,
            json!({ "productId": missing, "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not in cart");
}

#[tokio::test]
async fn test_create_intent_with_empty_cart() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");

    let (status, body) = app.create_intent(&token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn test_checkout_with_percentage_coupon() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    app.percent_coupon("SAVE10", 10, None).await;

    app.add_to_cart(&token, &product.id, 2).await;
    let (status, body) = app.create_intent(&token, Some("save10")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pricing"]["subTotal"], 200.0);
    assert_eq!(body["pricing"]["discount"], 20.0);
    assert_eq!(body["pricing"]["totalAmount"], 180.0);
    assert_eq!(body["paymentOrder"]["amount"], 18_000);
    assert_eq!(body["paymentOrder"]["currency"], "INR");

    // nothing is committed until verification
    let stored = app.state.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 5);
}

#[tokio::test]
async fn test_capped_coupon_and_bad_code() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    app.percent_coupon("HALF", 50, Some(3_000)).await;
    app.add_to_cart(&token, &product.id, 2).await;

    let (_, body) = app.create_intent(&token, Some("HALF")).await;
    assert_eq!(body["pricing"]["discount"], 30.0);
    assert_eq!(body["pricing"]["totalAmount"], 170.0);

    let (status, body) = app.create_intent(&token, Some("NOPE")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired coupon");
}

#[tokio::test]
async fn test_verify_twice_decrements_once() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    let coupon = app.percent_coupon("SAVE10", 10, None).await;

    app.add_to_cart(&token, &product.id, 2).await;
    let (_, intent) = app.create_intent(&token, Some("SAVE10")).await;
    let order_id = intent["orderId"].as_str().unwrap().to_string();

    let proof = json!({ "orderId": order_id, "paymentId": "pay_001" });
    let (status, body) = app.post("/api/payment/verify", &token, proof.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment verified and order placed");
    assert_eq!(body["couponRedeemed"], true);
    assert_eq!(body["stockShortfalls"].as_array().unwrap().len(), 0);

    let (status, body) = app.post("/api/payment/verify", &token, proof).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order already paid");

    let stored = app.state.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 3);

    let redeemed = app.state.db.coupons().get_by_id(&coupon.id).await.unwrap().unwrap();
    assert_eq!(redeemed.used_count, 1);

    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart["cart"]["items"].as_array().unwrap().len(), 0);

    let (status, body) = app.get(&format!("/api/orders/{}", order_id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["paymentStatus"], "paid");
    assert_eq!(body["order"]["orderStatus"], "confirmed");
    assert_eq!(body["order"]["coupon"]["code"], "SAVE10");
}

#[tokio::test]
async fn test_verify_without_payment_id() {
    let app = TestApp::new().await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    app.add_to_cart(&token, &product.id, 1).await;
    let (_, intent) = app.create_intent(&token, None).await;
    let order_id = intent["orderId"].as_str().unwrap();

    let (status, body) = app
        .post("/api/payment/verify", &token, json!({ "orderId": order_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment failed");

    let order = app.state.db.orders().get_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);

    // a failed attempt can be retried
    let (status, _) = app
        .post(
            "/api/payment/verify",
            &token,
            json!({ "orderId": order_id, "paymentId": "pay_retry" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_signed_verification() {
    let mut config = ApiConfig::for_tests();
    config.payment_key_secret = Some("gateway-secret".to_string());
    let app = TestApp::with_config(config).await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    app.add_to_cart(&token, &product.id, 1).await;

    let (_, intent) = app.create_intent(&token, None).await;
    let order_id = intent["orderId"].as_str().unwrap();
    let reference = intent["paymentOrder"]["id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/api/payment/verify",
            &token,
            json!({ "orderId": order_id, "paymentId": "pay_1", "signature": "00ff" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payment signature");

    let signature = app.state.gateway.sign(reference, "pay_1").unwrap();
    let (status, _) = app
        .post(
            "/api/payment/verify",
            &token,
            json!({ "orderId": order_id, "paymentId": "pay_1", "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_signature_covers_the_stored_payment_id() {
    let mut config = ApiConfig::for_tests();
    config.payment_key_secret = Some("gateway-secret".to_string());
    let app = TestApp::with_config(config).await;
    let token = app.user_token("user-1");
    let product = app.product("Ragi Chips", 10_000, 5).await;
    app.add_to_cart(&token, &product.id, 1).await;

    let (_, intent) = app.create_intent(&token, None).await;
    let order_id = intent["orderId"].as_str().unwrap();
    let reference = intent["paymentOrder"]["id"].as_str().unwrap();

    // signed over the padded id, which is not what would be stored
    let padded = app.state.gateway.sign(reference, " pay_7 ").unwrap();
    let (status, _) = app
        .post(
            "/api/payment/verify",
            &token,
            json!({ "orderId": order_id, "paymentId": " pay_7 ", "signature": padded }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let signature = app.state.gateway.sign(reference, "pay_7").unwrap();
    let (status, _) = app
        .post(
            "/api/payment/verify",
            &token,
            json!({ "orderId": order_id, "paymentId": " pay_7 ", "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let order = app.state.db.orders().get_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_id.as_deref(), Some("pay_7"));
}

#[tokio::test]
async fn test_orders_are_private() {
    let app = TestApp::new().await;
    let owner = app.user_token("user-1");
    let other = app.user_token("user-2");
    let product = app.product("Ragi Chips", 10_000, 5).await;

    app.add_to_cart(&owner, &product.id, 1).await;
    let (_, intent) = app.create_intent(&owner, None).await;
    let order_id = intent["orderId"].as_str().unwrap();

    let (status, body) = app.get(&format!("/api/orders/{}", order_id), Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");

    // nor can they pay for it
    let (status, _) = app
        .post(
            "/api/payment/verify",
            &other,
            json!({ "orderId": order_id, "paymentId": "pay_1" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/orders/mine", Some(&owner)).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
    let (_, body) = app.get("/api/orders/mine", Some(&other)).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 0);
}
