//! Checkout routes.
//!
//! ## Flow
//! ```text
//! POST /create-intent                         POST /verify
//!   │                                           │
//!   ├─ load cart + live catalog rows            ├─ load order (owner or admin)
//!   ├─ optional coupon lookup                   ├─ ensure_confirmable
//!   ├─ checkout::quote (reprice, coupon)        ├─ gateway.verify(proof)
//!   ├─ insert pending order                     │     └─ rejected ─► paymentStatus=failed
//!   └─ payment handoff {id, amount, currency}   └─ confirm_payment (one transaction)
//!                                                     paid, stock, coupon, cart
//! ```
//! No stock is reserved between the two calls.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use bites_core::checkout::{self, CouponRequest, PaymentHandoff, StockShortfall};
use bites_core::validation::{validate_shipping_address, validate_uuid};
use bites_core::{Cart, CoreError, OrderStatus, ShippingAddress, ValidationError};
use bites_db::ConfirmOutcome;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub sub_total: f64,
    pub discount: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub success: bool,
    pub order_id: String,
    pub payment_order: PaymentHandoff,
    pub pricing: Pricing,
}

/// Proof returned by the client after paying.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub order_id: String,
    /// Paid lines whose stock could not be decremented.
    pub stock_shortfalls: Vec<StockShortfall>,
    /// `null` when the order carries no coupon.
    pub coupon_redeemed: Option<bool>,
}

/// `POST /api/payment/create-intent`
pub async fn create_intent(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateIntentRequest>, JsonRejection>,
) -> ApiResult<Json<CreateIntentResponse>> {
    let Json(req) = payload?;

    if req.payment_method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "paymentMethod".to_string(),
        }
        .into());
    }
    validate_shipping_address(&req.shipping_address)?;

    let cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .unwrap_or_else(|| Cart::new(user.id.as_str()));

    let ids: Vec<String> = cart.items.iter().map(|i| i.product_id.clone()).collect();
    let products = state.db.products().get_many(&ids).await?;

    let coupon_code = req
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let coupon = match coupon_code {
        Some(code) => state.db.coupons().get_by_code(code).await?,
        None => None,
    };

    let now = Utc::now();
    let quote = checkout::quote(
        &cart,
        &products,
        coupon_code.map(|code| CouponRequest {
            code,
            coupon: coupon.as_ref(),
        }),
        now,
    )?;

    let order = quote.into_pending_order(&user.id, req.shipping_address, &req.payment_method, now);
    state.db.orders().insert(&order).await?;

    info!(
        order_id = %order.id,
        user_id = %user.id,
        total = order.total_amount.minor(),
        coupon = ?order.coupon.as_ref().map(|c| c.code.as_str()),
        "Created payment intent"
    );

    Ok(Json(CreateIntentResponse {
        success: true,
        order_id: order.id.clone(),
        payment_order: checkout::payment_handoff(&order, &state.config.payment_currency),
        pricing: Pricing {
            sub_total: order.subtotal.to_f64(),
            discount: order.discount.to_f64(),
            total_amount: order.total_amount.to_f64(),
        },
    }))
}

/// `POST /api/payment/verify`
pub async fn verify(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let Json(req) = payload?;
    validate_uuid(&req.order_id, "orderId")?;

    // Other users' orders are reported as missing.
    let order = state
        .db
        .orders()
        .get_by_id(&req.order_id)
        .await?
        .filter(|o| o.user_id == user.id || user.is_admin())
        .ok_or_else(|| CoreError::OrderNotFound(req.order_id.clone()))?;

    checkout::ensure_confirmable(&order)?;

    // The signature is checked against exactly the id that gets stored.
    let payment_id = req.payment_id.as_deref().map(str::trim).unwrap_or_default();
    if let Err(rejection) =
        state
            .gateway
            .verify(&order.payment_reference, payment_id, req.signature.as_deref())
    {
        warn!(order_id = %order.id, error = %rejection, "Payment proof rejected");
        state.db.orders().mark_payment_failed(&order.id).await?;
        return Err(rejection.into());
    }

    match state
        .db
        .orders()
        .confirm_payment(&order.id, payment_id, Utc::now())
        .await?
    {
        ConfirmOutcome::Confirmed {
            order,
            stock_shortfalls,
            coupon_redeemed,
        } => Ok(Json(VerifyPaymentResponse {
            success: true,
            message: "Payment verified and order placed".to_string(),
            order_id: order.id,
            stock_shortfalls,
            coupon_redeemed,
        })),
        ConfirmOutcome::AlreadyPaid => Err(CoreError::AlreadyPaid(order.id).into()),
        ConfirmOutcome::Cancelled => Err(ApiError::from(CoreError::InvalidStatusTransition {
            from: OrderStatus::Cancelled.to_string(),
            to: OrderStatus::Confirmed.to_string(),
        })),
    }
}
