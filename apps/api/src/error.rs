//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in 18 Bites                               │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError ─────── business rejection ──► 400 / 404 + its message       │
//! │  ValidationError ─ malformed input ─────► 400                           │
//! │  DbError ───────── duplicate ───────────► 400 "... already exists"      │
//! │                    not found ───────────► 404                           │
//! │                    anything else ───────► logged, 500 "Server error"    │
//! │  Auth ──────────── missing/bad token ───► 401                           │
//! │                    role mismatch ───────► 403 "Admin access required"   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  { "message": "..." }                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One classification layer for every handler: the same failure always
//! surfaces with the same status and message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use bites_core::{CoreError, ValidationError};
use bites_db::DbError;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub message: String,
}

/// API error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// 400 with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 for a role mismatch.
    pub fn forbidden() -> Self {
        ApiError::new(StatusCode::FORBIDDEN, "Admin access required")
    }

    /// 404 for a resource, e.g. "Order not found".
    pub fn not_found(resource: &str) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, format!("{} not found", resource))
    }

    /// 500. The cause is logged here and never sent to the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Unexpected server error");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Converts business rejections to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductUnavailable(_) => ApiError::not_found("Product"),
            CoreError::ItemNotInCart(_) => ApiError::new(StatusCode::NOT_FOUND, "Item not in cart"),
            CoreError::OrderNotFound(_) => ApiError::not_found("Order"),
            CoreError::CouponNotFound(_) => ApiError::bad_request("Invalid or expired coupon"),
            CoreError::UsageLimitReached(_) => ApiError::bad_request("Coupon usage limit reached"),
            CoreError::AlreadyPaid(_) => ApiError::bad_request("Order already paid"),
            CoreError::PaymentRejected { reason } => ApiError::bad_request(reason),
            CoreError::EmptyCart
            | CoreError::InvalidAmount { .. }
            | CoreError::ProductInactive { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::MinOrderNotMet { .. }
            | CoreError::InvalidStatusTransition { .. }
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_) => ApiError::bad_request(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(&entity),
            DbError::UniqueViolation { field, value } => {
                let message = if field.starts_with("coupons.") {
                    "Coupon already exists".to_string()
                } else {
                    format!("{} '{}' already exists", column_name(&field), value)
                };
                ApiError::bad_request(message)
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(format!("Invalid request: {}", rejection.body_text()))
    }
}

/// `products.sku` → `sku`
fn column_name(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bites_core::Money;

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::ProductUnavailable("p1".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Product not found");

        let err = ApiError::from(CoreError::CouponNotFound("SAVE10".to_string()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid or expired coupon");

        let err = ApiError::from(CoreError::MinOrderNotMet {
            min_order_value: Money::from_major(500),
            subtotal: Money::from_major(200),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("₹500.00"));

        let err = ApiError::from(CoreError::AlreadyPaid("o1".to_string()));
        assert_eq!(err.message, "Order already paid");

        let err = ApiError::from(CoreError::PaymentRejected {
            reason: "Invalid payment signature".to_string(),
        });
        assert_eq!(err.message, "Invalid payment signature");

        assert_eq!(ApiError::from(CoreError::EmptyCart).message, "Cart is empty");
    }

    #[test]
    fn test_db_error_mapping() {
        let err = ApiError::from(DbError::duplicate("coupons.code", "SAVE10"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Coupon already exists");

        let err = ApiError::from(DbError::duplicate("products.sku", "RAGI-1"));
        assert_eq!(err.message, "sku 'RAGI-1' already exists");

        let err = ApiError::from(DbError::not_found("Coupon", "c1"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Coupon not found");

        // internal details never leak
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Server error");
    }
}
