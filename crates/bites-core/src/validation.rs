//! # Validation Module
//!
//! Input validation utilities for 18 Bites.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client (storefront / admin console)                          │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (sku, coupon code)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bites_core::validation::{validate_quantity, validate_coupon_code};
//!
//! validate_quantity(5).unwrap();
//! assert_eq!(validate_coupon_code(" save10 ").unwrap(), "SAVE10");
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountType, ShippingAddress};
use crate::{
    DEFAULT_PAGE_SIZE, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PAGE, MAX_PAGE_SIZE, MAX_PRICE_MAJOR,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use bites_core::validation::validate_sku;
///
/// assert!(validate_sku("RAGI-CHIPS-100G").is_ok());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required("name"));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Normalizes and validates a coupon code.
///
/// Codes are case-insensitive; the canonical form is trimmed uppercase.
///
/// ## Returns
/// The canonical code.
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(required("code"));
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string (may be empty).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a shipping address: every field required, phone and postal
/// code must look plausible.
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<()> {
    let fields = [
        ("fullName", &address.full_name),
        ("phone", &address.phone),
        ("line1", &address.line1),
        ("city", &address.city),
        ("state", &address.state),
        ("postalCode", &address.postal_code),
        ("country", &address.country),
    ];

    for (field, value) in fields {
        let value = value.trim();
        if value.is_empty() {
            return Err(required(field));
        }
        if value.len() > 200 {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: 200,
            });
        }
    }

    let digits = address.phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits)
        || !address
            .phone
            .trim()
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a phone number".to_string(),
        });
    }

    if !address
        .postal_code
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "postalCode".to_string(),
            reason: "must contain only letters, digits, spaces, and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /api/cart/add { productId, quantity: 5 }                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → 400 "quantity must be positive"                  │
/// │       │                                                                 │
/// │       ├── qty > 999? → 400 "quantity must be between 1 and 999"        │
/// │       │                                                                 │
/// │       └── OK → stock check, then upsert the cart line                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Like [`validate_quantity`] but allows zero (cart update removes the line).
pub fn validate_update_quantity(qty: i64) -> ValidationResult<()> {
    if qty == 0 {
        return Ok(());
    }
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_quantity(qty)
}

/// Validates a catalog price (zero allowed, at most [`MAX_PRICE_MAJOR`]).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > Money::from_major(MAX_PRICE_MAJOR) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_MAJOR,
        });
    }

    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a coupon preview amount (strictly positive).
pub fn validate_preview_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Coupon Rule Validators
// =============================================================================

/// Validates a coupon's discount value (hundredths encoding).
///
/// ## Rules
/// - Must be positive
/// - Percentage must not exceed 100% (10000 bps)
pub fn validate_discount_value(discount_type: DiscountType, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "discountValue".to_string(),
        });
    }

    if discount_type == DiscountType::Percentage && value > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discountValue".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates that `valid_from` is strictly before `valid_until`.
pub fn validate_validity_window(
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
) -> ValidationResult<()> {
    if valid_from >= valid_until {
        return Err(ValidationError::Inconsistent {
            message: "validFrom must be before validUntil".to_string(),
        });
    }

    Ok(())
}

/// Validates coupon limits: non-negative minimum, positive cap, at least one use.
pub fn validate_coupon_limits(
    min_order_value: Money,
    max_discount: Option<Money>,
    max_uses: Option<i64>,
) -> ValidationResult<()> {
    if min_order_value.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "minOrderValue".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(cap) = max_discount {
        if !cap.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "maxDiscount".to_string(),
            });
        }
    }

    if let Some(uses) = max_uses {
        if uses < 1 {
            return Err(ValidationError::OutOfRange {
                field: "maxUses".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding a new distinct product.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Normalizes pagination parameters.
///
/// Missing values fall back to page 1 / `DEFAULT_PAGE_SIZE`.
///
/// ## Returns
/// `(page, limit)` with `page >= 1` and `1 <= limit <= MAX_PAGE_SIZE`.
pub fn validate_pagination(page: Option<i64>, limit: Option<i64>) -> ValidationResult<(i64, i64)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if page > MAX_PAGE {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: MAX_PAGE,
        });
    }

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }

    Ok((page, limit))
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use bites_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
/// assert!(validate_uuid("not-a-uuid", "id").is_err());
/// ```
pub fn validate_uuid(id: &str, field: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
