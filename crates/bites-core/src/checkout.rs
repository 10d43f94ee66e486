//! # Checkout Pipeline
//!
//! Authoritative repricing of a cart and construction of the pending order.
//!
//! ## Two-Phase Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Cart (stale snapshots)                                                 │
//! │     │                                                                   │
//! │     ▼  createIntent                                                     │
//! │  reprice() ── live catalog ──► Vec<OrderItem>, subtotal                 │
//! │     │            EmptyCart / ProductInactive / InsufficientStock        │
//! │     ▼                                                                   │
//! │  coupon::evaluate(subtotal) ──► discount, AppliedCoupon                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  total = max(subtotal - discount, 0)                                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Order[pending, payment pending] + PaymentHandoff { id, amount, cur }   │
//! │                                                                         │
//! │     ▼  confirmPayment (database layer, conditional updates)             │
//! │  Order[confirmed, paid] → stock -= qty (guarded) → coupon used += 1     │
//! │                         → cart cleared                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout always prices from the catalog, never from the cart snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::coupon::{self, CouponApplication};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    AppliedCoupon, Coupon, Order, OrderItem, OrderStatus, PaymentStatus, Product,
    ShippingAddress,
};

/// Coupon input to a quote: the code the user typed and its lookup result.
#[derive(Debug, Clone, Copy)]
pub struct CouponRequest<'a> {
    pub code: &'a str,
    pub coupon: Option<&'a Coupon>,
}

/// Priced checkout before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon: Option<AppliedCoupon>,
}

/// Opaque descriptor handed to the external payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentHandoff {
    /// Gateway reference stored on the order.
    pub id: String,
    /// Total in minor units.
    pub amount: i64,
    pub currency: String,
}

/// A paid order line whose guarded stock decrement did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: String,
    pub name: String,
    pub requested: i64,
}

/// Reprices every cart line against the live catalog.
///
/// `products` must contain the catalog rows for the cart's product ids;
/// ids with no row are treated as deactivated.
pub fn reprice(cart: &Cart, products: &[Product]) -> CoreResult<Vec<OrderItem>> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    cart.items
        .iter()
        .map(|line| {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductInactive {
                    product_id: line.product_id.clone(),
                    name: products
                        .iter()
                        .find(|p| p.id == line.product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| line.product_id.clone()),
                })?;

            if !product.has_stock_for(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            Ok(OrderItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.price,
            })
        })
        .collect()
}

/// Sum of line totals.
pub fn subtotal(items: &[OrderItem]) -> Money {
    items.iter().map(OrderItem::line_total).sum()
}

/// Prices a checkout: reprice, apply the coupon (if any), compute the total.
///
/// A coupon rejection fails the whole quote.
pub fn quote(
    cart: &Cart,
    products: &[Product],
    coupon: Option<CouponRequest<'_>>,
    now: DateTime<Utc>,
) -> CoreResult<Quote> {
    let items = reprice(cart, products)?;
    let subtotal = subtotal(&items);

    let application = coupon
        .map(|req| coupon::evaluate(req.code, req.coupon, subtotal, now))
        .transpose()?;

    let (discount, applied) = match application {
        Some(CouponApplication { discount, snapshot }) => (discount, Some(snapshot)),
        None => (Money::zero(), None),
    };

    Ok(Quote {
        items,
        subtotal,
        discount,
        total_amount: subtotal.saturating_sub_floor_zero(discount),
        coupon: applied,
    })
}

impl Quote {
    /// Builds the pending order for this quote with a fresh gateway reference.
    pub fn into_pending_order(
        self,
        user_id: &str,
        shipping_address: ShippingAddress,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> Order {
        Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            items: self.items,
            shipping_address,
            payment_method: payment_method.trim().to_string(),
            subtotal: self.subtotal,
            discount: self.discount,
            total_amount: self.total_amount,
            coupon: self.coupon,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            payment_reference: Uuid::new_v4().to_string(),
            payment_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payment descriptor for a pending order.
pub fn payment_handoff(order: &Order, currency: &str) -> PaymentHandoff {
    PaymentHandoff {
        id: order.payment_reference.clone(),
        amount: order.total_amount.minor(),
        currency: currency.to_string(),
    }
}

/// Pre-checks for a confirmation, before the proof is examined.
///
/// The database layer repeats the paid check atomically.
pub fn ensure_confirmable(order: &Order) -> CoreResult<()> {
    if order.is_paid() {
        return Err(CoreError::AlreadyPaid(order.id.clone()));
    }
    if order.order_status == OrderStatus::Cancelled {
        return Err(CoreError::InvalidStatusTransition {
            from: OrderStatus::Cancelled.to_string(),
            to: OrderStatus::Confirmed.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
