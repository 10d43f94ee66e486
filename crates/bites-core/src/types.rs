//! # Domain Types
//!
//! Core domain types used throughout 18 Bites.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Coupon      │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  code (UPPER)   │   │  items (frozen) │       │
//! │  │  price (Money)  │   │  discount_type  │   │  coupon (frozen)│       │
//! │  │  stock          │   │  validity window│   │  totals         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountType   │   │  PaymentStatus  │   │  OrderStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Flat           │   │  Pending        │   │  Pending        │       │
//! │  │  Percentage     │   │  Paid / Failed  │   │  Confirmed ...  │       │
//! │  └─────────────────┘   │  Refunded       │   │  Cancelled      │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Orders copy product names, unit prices and the applied coupon's terms at
//! creation time. Later catalog or coupon edits never alter history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// The catalog owns `price` and `stock`; carts only hold price snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name, copied into order lines.
    pub name: String,

    pub description: Option<String>,

    /// Current catalog price.
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be taken from current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Fixed amount off (`discount_value` in minor units).
    Flat,
    /// Percent off (`discount_value` in basis points).
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Flat => "flat",
            DiscountType::Percentage => "percentage",
        }
    }
}

/// Lifecycle bucket of a coupon relative to "now", used by admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Expired,
    Upcoming,
}

/// A discount rule identified by a case-insensitive code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    pub id: String,

    /// Stored uppercase.
    pub code: String,

    pub description: Option<String>,

    pub discount_type: DiscountType,

    /// Hundredths: minor units for `Flat`, basis points for `Percentage`.
    pub discount_value: i64,

    pub min_order_value: Money,

    /// Upper bound on a percentage discount.
    pub max_discount: Option<Money>,

    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,

    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,

    /// `None` means unlimited redemptions.
    pub max_uses: Option<i64>,

    pub used_count: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// True when `now` lies inside `[valid_from, valid_until]`.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    /// True when the usage cap (if any) still has room.
    pub fn has_uses_left(&self) -> bool {
        match self.max_uses {
            Some(max) => self.used_count < max,
            None => true,
        }
    }

    /// Active, inside its window and not exhausted.
    pub fn is_currently_applicable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_within_window(now) && self.has_uses_left()
    }

    /// Classifies the coupon for admin filtering.
    ///
    /// Inactive coupons count as expired regardless of their window.
    pub fn status_at(&self, now: DateTime<Utc>) -> CouponStatus {
        if !self.is_active || self.valid_until < now {
            CouponStatus::Expired
        } else if self.valid_from > now {
            CouponStatus::Upcoming
        } else {
            CouponStatus::Active
        }
    }

    /// The flat discount amount (meaningful for `Flat` only).
    #[inline]
    pub fn flat_amount(&self) -> Money {
        Money::from_minor(self.discount_value)
    }

    /// The percentage rate (meaningful for `Percentage` only).
    #[inline]
    pub fn rate(&self) -> Percent {
        Percent::from_bps(self.discount_value)
    }
}

/// Immutable record of the coupon terms actually applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    /// Same hundredths encoding as `Coupon::discount_value`.
    pub discount_value: i64,
    /// The discount computed for this order.
    pub discount_amount: Money,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state of an order, independent of fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment state of an order.
///
/// ## Lifecycle
/// ```text
///   Pending ──(paid)──► Confirmed ──► Shipped ──► Delivered
///      │                    │
///      └────────┬───────────┘
///               ▼
///           Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the lifecycle permits moving to `next`.
    ///
    /// `Pending → Confirmed` additionally requires the order to be paid.
    pub fn can_transition_to(&self, next: OrderStatus, payment: PaymentStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) => payment == PaymentStatus::Paid,
            (Confirmed, Shipped) => true,
            (Shipped, Delivered) => true,
            (Pending, Cancelled) | (Confirmed, Cancelled) => true,
            _ => false,
        }
    }

    /// Validates a transition, returning the new status.
    pub fn transition(&self, next: OrderStatus, payment: PaymentStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next, payment) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Delivery address captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A line of an order. Uses the snapshot pattern to freeze product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name: String,
    pub quantity: i64,
    /// Catalog price at time of checkout (frozen).
    pub unit_price: Money,
}

impl OrderItem {
    /// unit_price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A checkout attempt and, once paid, a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub subtotal: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon: Option<AppliedCoupon>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// Identifier handed to the payment gateway at intent time.
    pub payment_reference: String,
    /// Gateway payment id recorded on confirmation.
    pub payment_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(now: DateTime<Utc>) -> Coupon {
        Coupon {
            id: "c1".to_string(),
            code: "SAVE10".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            min_order_value: Money::zero(),
            max_discount: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            max_uses: Some(2),
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_coupon_applicability() {
        let now = Utc::now();
        let mut c = coupon(now);
        assert!(c.is_currently_applicable(now));

        c.used_count = 2;
        assert!(!c.has_uses_left());
        assert!(!c.is_currently_applicable(now));

        c.max_uses = None;
        assert!(c.is_currently_applicable(now));

        c.is_active = false;
        assert!(!c.is_currently_applicable(now));
    }

    #[test]
    fn test_coupon_window_is_inclusive() {
        let now = Utc::now();
        let c = coupon(now);
        assert!(c.is_within_window(c.valid_from));
        assert!(c.is_within_window(c.valid_until));
        assert!(!c.is_within_window(c.valid_until + Duration::seconds(1)));
    }

    #[test]
    fn test_coupon_status() {
        let now = Utc::now();
        let mut c = coupon(now);
        assert_eq!(c.status_at(now), CouponStatus::Active);
        assert_eq!(c.status_at(now + Duration::days(2)), CouponStatus::Expired);
        assert_eq!(c.status_at(now - Duration::days(2)), CouponStatus::Upcoming);

        c.is_active = false;
        assert_eq!(c.status_at(now), CouponStatus::Expired);
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        let paid = PaymentStatus::Paid;
        let pending = PaymentStatus::Pending;

        assert!(Pending.can_transition_to(Confirmed, paid));
        assert!(!Pending.can_transition_to(Confirmed, pending));
        assert!(Confirmed.can_transition_to(Shipped, paid));
        assert!(Shipped.can_transition_to(Delivered, paid));
        assert!(Pending.can_transition_to(Cancelled, pending));
        assert!(Confirmed.can_transition_to(Cancelled, paid));

        assert!(!Pending.can_transition_to(Shipped, paid));
        assert!(!Shipped.can_transition_to(Cancelled, paid));
        assert!(!Delivered.can_transition_to(Pending, paid));
        assert!(!Cancelled.can_transition_to(Confirmed, paid));
    }

    #[test]
    fn test_transition_error() {
        let err = OrderStatus::Delivered
            .transition(OrderStatus::Shipped, PaymentStatus::Paid)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change order status from delivered to shipped");
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            product_id: "p1".to_string(),
            name: "Millet Cookies".to_string(),
            quantity: 3,
            unit_price: Money::from_minor(4999),
        };
        assert_eq!(item.line_total().minor(), 14997);
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
