//! # Coupon Evaluator
//!
//! Decides whether a coupon applies to a subtotal and computes the discount.
//!
//! ## Evaluation Order
//! ```text
//! code ──► normalize (trim + UPPER) ──► lookup (caller, by exact code)
//!                                          │
//!          ┌───────────────────────────────┘
//!          ▼
//!   absent / inactive / outside window ──► CouponNotFound
//!          │
//!   subtotal < min_order_value ──────────► MinOrderNotMet
//!          │
//!   used_count >= max_uses ──────────────► UsageLimitReached
//!          │
//!          ▼
//!   raw = flat value | subtotal × rate
//!   raw = min(raw, max_discount)    (percentage only)
//!   discount = min(raw, subtotal)
//!          │
//!          ▼
//!   CouponApplication { discount, snapshot }
//! ```
//!
//! The evaluator never mutates the coupon. Redemption (`used_count += 1`)
//! happens in the database layer when a payment is confirmed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AppliedCoupon, Coupon, DiscountType};
use crate::validation::{
    validate_coupon_code, validate_coupon_limits, validate_discount_value,
    validate_validity_window,
};

/// Result of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponApplication {
    /// Discount to subtract from the subtotal. Never exceeds it.
    pub discount: Money,
    /// Frozen coupon terms to embed in an order.
    pub snapshot: AppliedCoupon,
}

impl CouponApplication {
    /// `subtotal - discount`, never below zero.
    pub fn discounted(&self, subtotal: Money) -> Money {
        subtotal.saturating_sub_floor_zero(self.discount)
    }
}

/// Canonical lookup form of a user-supplied code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Evaluates `coupon` (the result of looking up `code`) against `subtotal`.
///
/// Persisted coupon data is trusted; creation-time rules are enforced by
/// [`NewCoupon::validate`].
pub fn evaluate(
    code: &str,
    coupon: Option<&Coupon>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> CoreResult<CouponApplication> {
    let coupon = match coupon {
        Some(c) if c.is_active && c.is_within_window(now) => c,
        _ => return Err(CoreError::CouponNotFound(normalize_code(code))),
    };

    if subtotal < coupon.min_order_value {
        return Err(CoreError::MinOrderNotMet {
            min_order_value: coupon.min_order_value,
            subtotal,
        });
    }

    if !coupon.has_uses_left() {
        return Err(CoreError::UsageLimitReached(coupon.code.clone()));
    }

    let raw = match coupon.discount_type {
        DiscountType::Flat => coupon.flat_amount(),
        DiscountType::Percentage => {
            let pct = subtotal.percentage(coupon.rate());
            match coupon.max_discount {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
    };

    let discount = raw.min(subtotal).max(Money::zero());

    Ok(CouponApplication {
        discount,
        snapshot: AppliedCoupon {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            discount_amount: discount,
        },
    })
}

// =============================================================================
// Coupon Creation
// =============================================================================

/// Admin input for a new coupon, already converted to fixed-point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Hundredths encoding, see [`Coupon::discount_value`].
    pub discount_value: i64,
    pub min_order_value: Money,
    pub max_discount: Option<Money>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub max_uses: Option<i64>,
    pub is_active: bool,
}

impl NewCoupon {
    /// Checks creation-time rules and canonicalizes the code in place.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.code = validate_coupon_code(&self.code)?;
        validate_discount_value(self.discount_type, self.discount_value)?;
        validate_validity_window(self.valid_from, self.valid_until)?;
        validate_coupon_limits(self.min_order_value, self.max_discount, self.max_uses)?;

        if let Some(desc) = &self.description {
            if desc.len() > 500 {
                return Err(ValidationError::TooLong {
                    field: "description".to_string(),
                    max: 500,
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
