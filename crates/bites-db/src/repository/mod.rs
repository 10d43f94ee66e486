//! # Repository Module
//!
//! Database repository implementations for 18 Bites.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP service                                                          │
//! │       │                                                                 │
//! │       │  db.carts().get(user_id)                                       │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── get(&self, user_id)            → Option<Cart>                     │
//! │  ├── save(&self, cart)              → whole-cart replace               │
//! │  └── clear(&self, user_id)          → empty lines, zero total          │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, bound parameters)                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row structs (`*Row`, `FromRow`) stay private to this crate and are    │
//! │  converted into bites-core types before leaving a repository.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and guarded stock decrement
//! - [`cart::CartRepository`] - Per-user cart persistence
//! - [`coupon::CouponRepository`] - Coupon lookup, admin listing, redemption
//! - [`order::OrderRepository`] - Order snapshots and payment confirmation

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;

/// Number of pages needed for `total_items` at `limit` per page.
pub(crate) fn total_pages(total_items: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total_items + limit - 1) / limit
}

/// Row offset for a 1-based page. Saturates instead of wrapping, so an
/// absurd page reads past the end and comes back empty.
pub(crate) fn offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(0))
}

/// `%term%` pattern for a case-insensitive LIKE search.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};

    /// Fresh migrated in-memory database.
    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
