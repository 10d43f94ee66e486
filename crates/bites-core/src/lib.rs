//! # bites-core: Pure Pricing Logic for the 18 Bites Back Office
//!
//! This crate contains the order/cart pricing and coupon-application
//! pipeline as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        18 Bites Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Storefront / React Admin Console (HTTP clients)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bites-api (axum)                             │   │
//! │  │    /api/cart, /api/payment, /api/coupons, /api/orders           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bites-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────────┐  │   │
//! │  │   │  money  │  │ coupon  │  │  cart   │  │    checkout      │  │   │
//! │  │   │  Money  │  │evaluate │  │  Cart   │  │ reprice, quote   │  │   │
//! │  │   │ Percent │  │ snapshot│  │CartItem │  │ order lifecycle  │  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bites-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Fixed-point money (integer minor units) and percentages
//! - [`types`] - Domain types (Product, Coupon, Order, statuses)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`coupon`] - Coupon evaluator
//! - [`cart`] - Cart aggregator
//! - [`checkout`] - Authoritative repricing and order lifecycle
//!
//! ## Example Usage
//!
//! ```rust
//! use bites_core::money::{to_fixed_decimal, Money, Percent};
//!
//! let subtotal = to_fixed_decimal(200.0).unwrap();
//! let discount = subtotal.percentage(Percent::from_whole(10));
//! assert_eq!(discount, Money::from_minor(2000)); // 20.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use coupon::CouponApplication;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default page size for paginated admin listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on page size for paginated listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number a listing accepts. Keeps the row offset in range.
pub const MAX_PAGE: i64 = 1_000_000;

/// Highest catalog price in whole rupees.
///
/// At this price a full cart (100 lines of 999 units) still fits in an
/// `i64` of paise with room to spare.
pub const MAX_PRICE_MAJOR: i64 = 10_000_000;
