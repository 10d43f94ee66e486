//! Order read routes for shoppers.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use bites_core::validation::validate_uuid;
use bites_core::{
    AppliedCoupon, CoreError, DiscountType, Money, Order, OrderItem, OrderStatus, PaymentStatus,
    ShippingAddress,
};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub line_total: f64,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        OrderItemView {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.unit_price.to_f64(),
            line_total: item.line_total().to_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCouponView {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub discount_amount: f64,
}

impl From<&AppliedCoupon> for AppliedCouponView {
    fn from(coupon: &AppliedCoupon) -> Self {
        AppliedCouponView {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: Money::from_minor(coupon.discount_value).to_f64(),
            discount_amount: coupon.discount_amount.to_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemView>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub sub_total: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub coupon: Option<AppliedCouponView>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        OrderView {
            items: order.items.iter().map(OrderItemView::from).collect(),
            coupon: order.coupon.as_ref().map(AppliedCouponView::from),
            sub_total: order.subtotal.to_f64(),
            discount: order.discount.to_f64(),
            total_amount: order.total_amount.to_f64(),
            id: order.id,
            user_id: order.user_id,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            order_status: order.order_status,
            payment_id: order.payment_id,
            paid_at: order.paid_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderResponse {
    pub success: bool,
    pub order: OrderView,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<OrderView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/orders/mine`, newest first.
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<OrderListResponse>> {
    let orders = state.db.orders().list_for_user(&user.id).await?;

    Ok(Json(OrderListResponse {
        success: true,
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// `GET /api/orders/{id}`. Owner or admin; anyone else gets 404.
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let id = order_id(id)?;

    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .filter(|o| o.user_id == user.id || user.is_admin())
        .ok_or(CoreError::OrderNotFound(id))?;

    Ok(Json(OrderResponse {
        success: true,
        order: OrderView::from(order),
    }))
}

/// Path id, checked to be a UUID.
pub(crate) fn order_id(id: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid order ID"))?;
    validate_uuid(&id, "orderId").map_err(|_| ApiError::bad_request("Invalid order ID"))?;
    Ok(id)
}
