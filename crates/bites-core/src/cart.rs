//! # Cart Aggregator
//!
//! The per-user staging area of products, quantities and price snapshots.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  HTTP Request             Operation               Cart State Change     │
//! │  ────────────             ─────────               ─────────────────     │
//! │                                                                         │
//! │  POST /cart/add ─────────► add_item() ──────────► upsert line + price  │
//! │                                                                         │
//! │  PUT /cart/update ───────► update_item() ───────► qty = n (0 removes)  │
//! │                                                                         │
//! │  DELETE /cart/remove ────► remove_item() ───────► retain (idempotent)  │
//! │                                                                         │
//! │  DELETE /cart/clear ─────► clear() ─────────────► items = [], total 0  │
//! │                                                                         │
//! │  Every mutation ends in recompute():                                    │
//! │      total_price = Σ unit_price × quantity                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stale Snapshots
//! `unit_price` is captured when a line is added or updated and is NOT
//! refreshed when the catalog price changes. Checkout reprices from the
//! catalog (see [`crate::checkout`]); the cart shows the last-known price.
//!
//! Mutations are all-or-nothing: a rejected operation leaves the cart
//! exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_quantity, validate_update_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,

    /// Always ≥ 1.
    pub quantity: i64,

    /// Catalog price when this line was last touched (frozen).
    pub unit_price: Money,
}

impl CartItem {
    /// unit_price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A user's cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - `total_price == Σ line_total()` after every mutation
/// - At most `MAX_CART_ITEMS` lines, each quantity ≤ `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub user_id: String,

    pub items: Vec<CartItem>,

    /// Stored running total; readers never recompute it.
    pub total_price: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            user_id: user_id.into(),
            items: Vec::new(),
            total_price: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a product or increases the quantity of its existing line.
    ///
    /// `product` is the catalog lookup result for `product_id`.
    ///
    /// ## Errors
    /// - `ProductUnavailable` if the product is missing or inactive
    /// - `InsufficientStock` if existing + requested exceeds stock
    /// - `QuantityTooLarge` / `CartTooLarge` on cart limits
    pub fn add_item(
        &mut self,
        product_id: &str,
        product: Option<&Product>,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let product = available(product_id, product)?;
        let existing = self.line(product_id).map(|i| i.quantity).unwrap_or(0);
        let new_qty = existing + quantity;

        if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        check_stock(product, new_qty)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = new_qty;
                item.unit_price = product.price;
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
                }
                self.items.push(CartItem {
                    product_id: product_id.to_string(),
                    quantity: new_qty,
                    unit_price: product.price,
                });
            }
        }

        self.recompute();
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    ///
    /// ## Errors
    /// - `ItemNotInCart` if there is no line for `product_id`
    /// - `ProductUnavailable` / `InsufficientStock` for non-zero quantities
    pub fn update_item(
        &mut self,
        product_id: &str,
        product: Option<&Product>,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_update_quantity(quantity)?;

        if self.line(product_id).is_none() {
            return Err(CoreError::ItemNotInCart(product_id.to_string()));
        }

        if quantity == 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        let product = available(product_id, product)?;
        check_stock(product, quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            item.unit_price = product.price;
        }

        self.recompute();
        Ok(())
    }

    /// Removes a line. Removing an absent product is not an error.
    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id != product_id);
        self.recompute();
    }

    /// Empties the cart and zeroes the total.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    /// Recomputes and stores `total_price` from the lines.
    pub fn recompute(&mut self) {
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
        self.updated_at = Utc::now();
    }

    /// Finds the line for `product_id`.
    pub fn line(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn available<'a>(product_id: &str, product: Option<&'a Product>) -> CoreResult<&'a Product> {
    match product {
        Some(p) if p.is_active => Ok(p),
        _ => Err(CoreError::ProductUnavailable(product_id.to_string())),
    }
}

fn check_stock(product: &Product, quantity: i64) -> CoreResult<()> {
    if !product.has_stock_for(quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: quantity,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_minor: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            description: None,
            price: Money::from_minor(price_minor),
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn assert_total_invariant(cart: &Cart) {
        let expected: i64 = cart
            .items
            .iter()
            .map(|i| i.unit_price.minor() * i.quantity)
            .sum();
        assert_eq!(cart.total_price.minor(), expected);
    }

    #[test]
    fn test_full_cart_at_price_cap_fits() {
        let mut cart = Cart::new("u1");
        let price = Money::from_major(crate::MAX_PRICE_MAJOR);

        for n in 0..MAX_CART_ITEMS {
            let id = n.to_string();
            let p = product(&id, price.minor(), MAX_ITEM_QUANTITY);
            cart.add_item(&id, Some(&p), MAX_ITEM_QUANTITY).unwrap();
        }

        assert_eq!(
            cart.total_price.minor(),
            price.minor() * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64
        );
        assert_total_invariant(&cart);
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new("u1");
        let p = product("1", 999, 10);

        cart.add_item("1", Some(&p), 2).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_price.minor(), 1998);
    }

    #[test]
    fn test_add_same_product_increases_quantity_and_refreshes_price() {
        let mut cart = Cart::new("u1");
        let mut p = product("1", 999, 10);

        cart.add_item("1", Some(&p), 2).unwrap();
        p.price = Money::from_minor(1099);
        cart.add_item("1", Some(&p), 3).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].unit_price.minor(), 1099);
        assert_eq!(cart.total_price.minor(), 5495);
    }

    #[test]
    fn test_snapshot_goes_stale_until_touched() {
        let mut cart = Cart::new("u1");
        let mut a = product("a", 1000, 10);
        let b = product("b", 500, 10);

        cart.add_item("a", Some(&a), 1).unwrap();
        a.price = Money::from_minor(2000);
        cart.add_item("b", Some(&b), 1).unwrap();

        // line "a" keeps its old snapshot
        assert_eq!(cart.line("a").unwrap().unit_price.minor(), 1000);
        assert_eq!(cart.total_price.minor(), 1500);
    }

    #[test]
    fn test_add_rejects_unavailable_products() {
        let mut cart = Cart::new("u1");
        assert!(matches!(
            cart.add_item("missing", None, 1),
            Err(CoreError::ProductUnavailable(_))
        ));

        let mut p = product("1", 100, 10);
        p.is_active = false;
        assert!(matches!(
            cart.add_item("1", Some(&p), 1),
            Err(CoreError::ProductUnavailable(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insufficient_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new("u1");
        let p = product("1", 10_000, 1);

        let err = cart.add_item("1", Some(&p), 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 1, requested: 2, .. }
        ));
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn test_add_checks_combined_quantity_against_stock() {
        let mut cart = Cart::new("u1");
        let p = product("1", 100, 3);

        cart.add_item("1", Some(&p), 2).unwrap();
        assert!(cart.add_item("1", Some(&p), 2).is_err());
        assert_eq!(cart.items[0].quantity, 2);
        assert_total_invariant(&cart);
    }

    #[test]
    fn test_update_item() {
        let mut cart = Cart::new("u1");
        let p = product("1", 250, 10);
        cart.add_item("1", Some(&p), 1).unwrap();

        cart.update_item("1", Some(&p), 4).unwrap();
        assert_eq!(cart.total_price.minor(), 1000);

        assert!(matches!(
            cart.update_item("1", Some(&p), 11),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(cart.items[0].quantity, 4);

        cart.update_item("1", Some(&p), 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn test_update_missing_line_is_item_not_in_cart() {
        let mut cart = Cart::new("u1");
        let p = product("1", 250, 10);
        assert!(matches!(
            cart.update_item("1", Some(&p), 1),
            Err(CoreError::ItemNotInCart(_))
        ));
        assert!(matches!(
            cart.update_item("1", Some(&p), 0),
            Err(CoreError::ItemNotInCart(_))
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new("u1");
        let a = product("a", 300, 10);
        let b = product("b", 700, 10);
        cart.add_item("a", Some(&a), 2).unwrap();
        cart.add_item("b", Some(&b), 1).unwrap();

        cart.remove_item("a");
        let once = (cart.items.clone(), cart.total_price);
        cart.remove_item("a");
        assert_eq!((cart.items.clone(), cart.total_price), once);
        assert_eq!(cart.total_price.minor(), 700);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new("u1");
        let p = product("1", 999, 10);
        cart.add_item("1", Some(&p), 2).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn test_total_invariant_over_mixed_sequence() {
        let mut cart = Cart::new("u1");
        let products: Vec<Product> = (0..5)
            .map(|i| product(&i.to_string(), 111 * (i + 1), 50))
            .collect();

        for (step, p) in products.iter().cycle().take(20).enumerate() {
            match step % 4 {
                0 | 1 => {
                    let _ = cart.add_item(&p.id, Some(p), (step as i64 % 3) + 1);
                }
                2 => {
                    let _ = cart.update_item(&p.id, Some(p), step as i64 % 4);
                }
                _ => cart.remove_item(&p.id),
            }
            assert_total_invariant(&cart);
        }
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new("u1");
        let p = product("1", 1, 10_000);
        cart.add_item("1", Some(&p), MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_item("1", Some(&p), 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(cart.add_item("1", Some(&p), 0).is_err());
    }
}
