//! # Error Types
//!
//! Domain-specific error types for bites-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bites-core errors (this file)                                         │
//! │  ├── CoreError        - Business rejections (cart, coupon, checkout)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bites-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bites-api errors (in app)                                             │
//! │  └── ApiError         - `{ "message": ... }` + HTTP status             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries enough context (product id, coupon code, amounts)
//! to produce a human-readable message without a lookup.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule rejections. The API layer classifies each
/// variant into an HTTP status; the `Display` text is the client message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A monetary input was not a finite, representable number.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Product is missing or deactivated when adding to the cart.
    #[error("Product not found: {0}")]
    ProductUnavailable(String),

    /// Product referenced by a cart line is missing or deactivated at checkout.
    #[error("Product {name} is no longer available")]
    ProductInactive { product_id: String, name: String },

    /// Requested quantity exceeds current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 2)
    ///      │
    ///      ▼
    /// Check stock: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Ragi Chips", available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// Client shows: "Insufficient stock for Ragi Chips"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Update targeted a product with no existing cart line.
    #[error("Item not found in cart: {0}")]
    ItemNotInCart(String),

    /// Checkout attempted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Coupon code absent, inactive or outside its validity window.
    #[error("Invalid or expired coupon: {0}")]
    CouponNotFound(String),

    /// Subtotal below the coupon's minimum order value.
    #[error("Minimum order value of {min_order_value} required, current subtotal is {subtotal}")]
    MinOrderNotMet { min_order_value: Money, subtotal: Money },

    /// Coupon has been redeemed `max_uses` times.
    #[error("Coupon usage limit reached: {0}")]
    UsageLimitReached(String),

    /// Order id does not exist (or is not visible to the caller).
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Second confirmation for an already paid order.
    #[error("Order {0} is already paid")]
    AlreadyPaid(String),

    /// Payment proof missing or failed verification.
    #[error("Payment verification failed: {reason}")]
    PaymentRejected { reason: String },

    /// Order status change not permitted by the lifecycle.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Cart has exceeded maximum allowed distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements and are
/// reported before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., coupon code, SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Two fields are inconsistent with each other.
    #[error("{message}")]
    Inconsistent { message: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
