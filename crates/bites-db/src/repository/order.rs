//! # Order Repository
//!
//! Order snapshots, admin listing and statistics, and the payment
//! confirmation transaction.
//!
//! ## Storage
//! ```text
//! orders       one row per checkout attempt; shipping address and the
//!              applied coupon are flattened into columns (frozen copies)
//! order_items  one row per line, ordered by `position`
//! ```
//!
//! ## Payment Confirmation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE orders SET payment_status = 'paid', order_status = 'confirmed'│
//! │    WHERE id = ? AND payment_status <> 'paid' AND order_status='pending' │
//! │        │                                                                │
//! │        ├── 0 rows ──► ROLLBACK, report AlreadyPaid / Cancelled          │
//! │        ▼                                                                │
//! │    for each line:                                                       │
//! │      UPDATE products SET stock = stock - qty                            │
//! │      WHERE id = ? AND stock >= qty     (miss → StockShortfall)          │
//! │        ▼                                                                │
//! │    UPDATE coupons SET used_count = used_count + 1 (capped)              │
//! │        ▼                                                                │
//! │    clear the owner's cart                                               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Guard misses are business outcomes and do not roll back the payment.
//! Any database error rolls back the whole confirmation, so a paid order
//! never exists without its stock and cart side effects.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{cart, coupon, like_pattern, offset, product, total_pages};
use bites_core::checkout::StockShortfall;
use bites_core::{
    AppliedCoupon, DiscountType, Money, Order, OrderItem, OrderStatus, PaymentStatus,
    ShippingAddress,
};

const ORDER_COLUMNS: &str = r#"
    id, user_id,
    ship_full_name, ship_phone, ship_line1, ship_city, ship_state,
    ship_postal_code, ship_country,
    payment_method, subtotal_cents, discount_cents, total_amount_cents,
    coupon_code, coupon_discount_type, coupon_discount_value, coupon_discount_cents,
    payment_status, order_status, payment_reference, payment_id, paid_at,
    created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    ship_full_name: String,
    ship_phone: String,
    ship_line1: String,
    ship_city: String,
    ship_state: String,
    ship_postal_code: String,
    ship_country: String,
    payment_method: String,
    subtotal_cents: i64,
    discount_cents: i64,
    total_amount_cents: i64,
    coupon_code: Option<String>,
    coupon_discount_type: Option<DiscountType>,
    coupon_discount_value: Option<i64>,
    coupon_discount_cents: Option<i64>,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    payment_reference: String,
    payment_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price_cents),
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        let coupon = match (
            self.coupon_code,
            self.coupon_discount_type,
            self.coupon_discount_value,
            self.coupon_discount_cents,
        ) {
            (None, None, None, None) => None,
            (Some(code), Some(discount_type), Some(discount_value), Some(discount_cents)) => {
                Some(AppliedCoupon {
                    code,
                    discount_type,
                    discount_value,
                    discount_amount: Money::from_minor(discount_cents),
                })
            }
            _ => {
                return Err(DbError::corrupt(
                    "Order",
                    format!("{}: partial coupon snapshot", self.id),
                ))
            }
        };

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            shipping_address: ShippingAddress {
                full_name: self.ship_full_name,
                phone: self.ship_phone,
                line1: self.ship_line1,
                city: self.ship_city,
                state: self.ship_state,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            payment_method: self.payment_method,
            subtotal: Money::from_minor(self.subtotal_cents),
            discount: Money::from_minor(self.discount_cents),
            total_amount: Money::from_minor(self.total_amount_cents),
            coupon,
            payment_status: self.payment_status,
            order_status: self.order_status,
            payment_reference: self.payment_reference,
            payment_id: self.payment_id,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Admin listing parameters.
#[derive(Debug, Clone)]
pub struct OrderListQuery {
    pub page: i64,
    pub limit: i64,
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring of the order id; empty matches all.
    pub search: String,
}

/// Order figures for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of `total_amount` over delivered orders.
    pub delivered_revenue: Money,
}

/// One page of orders.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// Result of [`OrderRepository::confirm_payment`].
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// The order is now paid and confirmed.
    Confirmed {
        order: Order,
        /// Lines whose guarded decrement found too little stock.
        stock_shortfalls: Vec<StockShortfall>,
        /// `None` without a coupon; `Some(false)` if its cap was hit meanwhile.
        coupon_redeemed: Option<bool>,
    },
    /// Another confirmation won; nothing was changed.
    AlreadyPaid,
    /// The order was cancelled before payment arrived.
    Cancelled,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a new order with its lines.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total_amount.minor(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        let coupon = order.coupon.as_ref();
        let address = &order.shipping_address;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id,
                ship_full_name, ship_phone, ship_line1, ship_city, ship_state,
                ship_postal_code, ship_country,
                payment_method, subtotal_cents, discount_cents, total_amount_cents,
                coupon_code, coupon_discount_type, coupon_discount_value, coupon_discount_cents,
                payment_status, order_status, payment_reference, payment_id, paid_at,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&address.full_name)
        .bind(&address.phone)
        .bind(&address.line1)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.country)
        .bind(&order.payment_method)
        .bind(order.subtotal.minor())
        .bind(order.discount.minor())
        .bind(order.total_amount.minor())
        .bind(coupon.map(|c| c.code.clone()))
        .bind(coupon.map(|c| c.discount_type))
        .bind(coupon.map(|c| c.discount_value))
        .bind(coupon.map(|c| c.discount_amount.minor()))
        .bind(order.payment_status)
        .bind(order.order_status)
        .bind(&order.payment_reference)
        .bind(&order.payment_id)
        .bind(order.paid_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, name, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        load_order(&mut conn, id).await
    }

    /// All orders of one user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, rows).await
    }

    /// Admin listing, newest first, optionally filtered by order status and
    /// order id search.
    pub async fn list(&self, query: &OrderListQuery) -> DbResult<OrderPage> {
        let mut conn = self.pool.acquire().await?;
        let pattern = like_pattern(&query.search);

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count, &pattern, query.status);
        let total_items = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filters(&mut select, &pattern, query.status);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(offset(query.page, query.limit));

        let rows = select
            .build_query_as::<OrderRow>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(OrderPage {
            orders: attach_items(&mut conn, rows).await?,
            page: query.page,
            limit: query.limit,
            total_items,
            total_pages: total_pages(total_items, query.limit),
        })
    }

    /// Order counts and delivered revenue in one pass over `orders`.
    pub async fn stats(&self) -> DbResult<OrderStats> {
        let (total_orders, pending_orders, revenue_cents): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN order_status = 'pending' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN order_status = 'delivered' THEN total_amount_cents ELSE 0 END), 0)
            FROM orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderStats {
            total_orders,
            pending_orders,
            delivered_revenue: Money::from_minor(revenue_cents),
        })
    }

    /// Marks an unpaid order's payment as failed. The order stays pending.
    ///
    /// ## Returns
    /// `false` if the order is missing or already paid.
    pub async fn mark_payment_failed(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET payment_status = ?2, updated_at = ?3
            WHERE id = ?1 AND payment_status <> 'paid'
            "#,
        )
        .bind(id)
        .bind(PaymentStatus::Failed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves an order from `from` to `to` if nobody changed it meanwhile.
    ///
    /// The caller validates the transition; this only guards the write.
    pub async fn update_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> DbResult<bool> {
        debug!(order_id = %id, from = %from, to = %to, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders SET order_status = ?3, updated_at = ?4
            WHERE id = ?1 AND order_status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Finalizes a paid order in one transaction.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the order does not exist.
    pub async fn confirm_payment(
        &self,
        id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<ConfirmOutcome> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = ?2,
                order_status = ?3,
                payment_id = ?4,
                paid_at = ?5,
                updated_at = ?5
            WHERE id = ?1 AND payment_status <> 'paid' AND order_status = 'pending'
            "#,
        )
        .bind(id)
        .bind(PaymentStatus::Paid)
        .bind(OrderStatus::Confirmed)
        .bind(payment_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let state: Option<(PaymentStatus, OrderStatus)> = sqlx::query_as(
                "SELECT payment_status, order_status FROM orders WHERE id = ?1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            tx.rollback().await?;

            return match state {
                None => Err(DbError::not_found("Order", id)),
                Some((PaymentStatus::Paid, _)) => Ok(ConfirmOutcome::AlreadyPaid),
                Some(_) => Ok(ConfirmOutcome::Cancelled),
            };
        }

        let order = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        let mut stock_shortfalls = Vec::new();
        for item in &order.items {
            if !product::decrement_stock(&mut *tx, &item.product_id, item.quantity).await? {
                warn!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    requested = item.quantity,
                    "Stock shortfall on paid order"
                );
                stock_shortfalls.push(StockShortfall {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    requested: item.quantity,
                });
            }
        }

        let coupon_redeemed = match &order.coupon {
            Some(applied) => {
                let redeemed = coupon::redeem_in(&mut tx, &applied.code).await?;
                if !redeemed {
                    warn!(
                        order_id = %order.id,
                        code = %applied.code,
                        "Coupon usage cap reached before redemption"
                    );
                }
                Some(redeemed)
            }
            None => None,
        };

        cart::clear_for_user(&mut tx, &order.user_id).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total_amount.minor(),
            shortfalls = stock_shortfalls.len(),
            "Payment confirmed"
        );

        Ok(ConfirmOutcome::Confirmed {
            order,
            stock_shortfalls,
            coupon_redeemed,
        })
    }
}

fn push_filters(builder: &mut QueryBuilder<Sqlite>, pattern: &str, status: Option<OrderStatus>) {
    builder
        .push(" WHERE LOWER(id) LIKE ")
        .push_bind(pattern.to_string())
        .push(r" ESCAPE '\'");

    if let Some(status) = status {
        builder.push(" AND order_status = ").push_bind(status);
    }
}

async fn load_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(attach_items(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Loads the lines for `rows` in one query and assembles the orders,
/// preserving the order of `rows`.
async fn attach_items(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT order_id, product_id, name, quantity, unit_price_cents FROM order_items WHERE order_id IN (",
    );
    let mut separated = builder.separated(", ");
    for row in &rows {
        separated.push_bind(row.id.clone());
    }
    separated.push_unseparated(") ORDER BY order_id, position");

    let item_rows = builder
        .build_query_as::<OrderItemRow>()
        .fetch_all(&mut *conn)
        .await?;

    let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
        by_order
            .entry(item.order_id.clone())
            .or_default()
            .push(OrderItem::from(item));
    }

    rows.into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::coupon::tests::new_coupon;
    use crate::repository::product::tests::sample;
    use crate::repository::test_support;
    use crate::Database;
    use bites_core::checkout::{self, CouponRequest};
    use bites_core::{Cart, Product};

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".to_string(),
            phone: "+91 98450 12345".to_string(),
            line1: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            postal_code: "560001".to_string(),
            country: "IN".to_string(),
        }
    }

    /// Saves a cart for `user` holding `qty` of `product` and places a
    /// pending order for it.
    async fn place_order(
        db: &Database,
        user: &str,
        product: &Product,
        qty: i64,
        code: Option<&str>,
    ) -> Order {
        let mut cart = Cart::new(user);
        cart.add_item(&product.id, Some(product), qty).unwrap();
        db.carts().save(&cart).await.unwrap();

        let coupon = match code {
            Some(code) => db.coupons().get_by_code(code).await.unwrap(),
            None => None,
        };
        let request = code.map(|code| CouponRequest {
            code,
            coupon: coupon.as_ref(),
        });

        let now = Utc::now();
        let order = checkout::quote(&cart, std::slice::from_ref(product), request, now)
            .unwrap()
            .into_pending_order(user, address(), "upi", now);
        db.orders().insert(&order).await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("RAGI", 10_000, 5)).await.unwrap();
        db.coupons().insert(&new_coupon("SAVE10", 1000, None)).await.unwrap();

        let order = place_order(&db, "u1", &p, 2, Some("save10")).await;
        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();

        assert_eq!(loaded.items, order.items);
        assert_eq!(loaded.shipping_address, order.shipping_address);
        assert_eq!(loaded.subtotal.minor(), 20_000);
        assert_eq!(loaded.discount.minor(), 2_000);
        assert_eq!(loaded.total_amount.minor(), 18_000);
        assert_eq!(loaded.coupon, order.coupon);
        assert_eq!(loaded.payment_status, PaymentStatus::Pending);
        assert_eq!(loaded.order_status, OrderStatus::Pending);

        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_double_confirm_decrements_once() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("JOWAR", 10_000, 5)).await.unwrap();
        let order = place_order(&db, "u1", &p, 2, None).await;

        let first = db.orders().confirm_payment(&order.id, "pay_1", Utc::now()).await.unwrap();
        match first {
            ConfirmOutcome::Confirmed {
                order: confirmed,
                stock_shortfalls,
                coupon_redeemed,
            } => {
                assert_eq!(confirmed.payment_status, PaymentStatus::Paid);
                assert_eq!(confirmed.order_status, OrderStatus::Confirmed);
                assert_eq!(confirmed.payment_id.as_deref(), Some("pay_1"));
                assert!(confirmed.paid_at.is_some());
                assert!(stock_shortfalls.is_empty());
                assert_eq!(coupon_redeemed, None);
            }
            other => panic!("expected Confirmed, got {other:?}"),
        }

        let second = db.orders().confirm_payment(&order.id, "pay_2", Utc::now()).await.unwrap();
        assert!(matches!(second, ConfirmOutcome::AlreadyPaid));

        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 3);

        let cart = db.carts().get("u1").await.unwrap().unwrap();
        assert!(cart.is_empty());

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn test_confirm_reports_shortfall_and_redeems_coupon() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("MILLET", 5_000, 2)).await.unwrap();
        db.coupons().insert(&new_coupon("ONCE", 1000, Some(1))).await.unwrap();
        let order = place_order(&db, "u1", &p, 2, Some("ONCE")).await;

        // another checkout drains the stock between intent and confirmation
        assert!(db.products().decrement_stock(&p.id, 1).await.unwrap());

        let outcome = db.orders().confirm_payment(&order.id, "pay_1", Utc::now()).await.unwrap();
        let ConfirmOutcome::Confirmed {
            stock_shortfalls,
            coupon_redeemed,
            ..
        } = outcome
        else {
            panic!("expected Confirmed");
        };

        assert_eq!(
            stock_shortfalls,
            vec![StockShortfall {
                product_id: p.id.clone(),
                name: p.name.clone(),
                requested: 2,
            }]
        );
        assert_eq!(coupon_redeemed, Some(true));

        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 1);
        assert_eq!(db.coupons().get_by_code("ONCE").await.unwrap().unwrap().used_count, 1);
    }

    #[tokio::test]
    async fn test_confirm_missing_and_cancelled() {
        let db = test_support::db().await;
        assert!(matches!(
            db.orders().confirm_payment("missing", "pay", Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));

        let p = db.products().insert(&sample("PUFFS", 1_000, 5)).await.unwrap();
        let order = place_order(&db, "u1", &p, 1, None).await;
        assert!(db
            .orders()
            .update_status(&order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap());

        let outcome = db.orders().confirm_payment(&order.id, "pay", Utc::now()).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Cancelled));
        assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_mark_payment_failed() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("BAR", 1_000, 5)).await.unwrap();
        let order = place_order(&db, "u1", &p, 1, None).await;

        assert!(db.orders().mark_payment_failed(&order.id).await.unwrap());
        let failed = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(failed.payment_status, PaymentStatus::Failed);
        assert_eq!(failed.order_status, OrderStatus::Pending);

        // a failed attempt can still be confirmed by a later valid proof
        let outcome = db.orders().confirm_payment(&order.id, "pay", Utc::now()).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Confirmed { .. }));
        assert!(!db.orders().mark_payment_failed(&order.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_is_conditional() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("CHIPS", 1_000, 5)).await.unwrap();
        let order = place_order(&db, "u1", &p, 1, None).await;
        db.orders().confirm_payment(&order.id, "pay", Utc::now()).await.unwrap();

        let orders = db.orders();
        assert!(orders
            .update_status(&order.id, OrderStatus::Confirmed, OrderStatus::Shipped)
            .await
            .unwrap());
        // stale expectation loses
        assert!(!orders
            .update_status(&order.id, OrderStatus::Confirmed, OrderStatus::Cancelled)
            .await
            .unwrap());

        let stored = orders.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.order_status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_listing() {
        let db = test_support::db().await;
        let p = db.products().insert(&sample("MIX", 1_000, 50)).await.unwrap();

        let first = place_order(&db, "u1", &p, 1, None).await;
        let second = place_order(&db, "u1", &p, 2, None).await;
        place_order(&db, "u2", &p, 3, None).await;
        db.orders().confirm_payment(&second.id, "pay", Utc::now()).await.unwrap();

        let mine = db.orders().list_for_user("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.user_id == "u1"));
        assert!(mine.iter().all(|o| o.items.len() == 1));
        assert!(mine[0].created_at >= mine[1].created_at);
        assert!(mine.iter().any(|o| o.id == first.id));

        let all = db
            .orders()
            .list(&OrderListQuery {
                page: 1,
                limit: 2,
                status: None,
                search: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(all.total_items, 3);
        assert_eq!(all.total_pages, 2);
        assert_eq!(all.orders.len(), 2);

        let confirmed = db
            .orders()
            .list(&OrderListQuery {
                page: 1,
                limit: 10,
                status: Some(OrderStatus::Confirmed),
                search: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(confirmed.total_items, 1);
        assert_eq!(confirmed.orders[0].id, second.id);
        assert_eq!(confirmed.orders[0].items[0].quantity, 2);

        let prefix = second.id[..8].to_uppercase();
        let found = db
            .orders()
            .list(&OrderListQuery {
                page: 1,
                limit: 10,
                status: None,
                search: prefix,
            })
            .await
            .unwrap();
        assert_eq!(found.total_items, 1);
        assert_eq!(found.orders[0].id, second.id);

        let none = db
            .orders()
            .list(&OrderListQuery {
                page: 1,
                limit: 10,
                status: Some(OrderStatus::Pending),
                search: second.id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(none.total_items, 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let db = test_support::db().await;
        let empty = db.orders().stats().await.unwrap();
        assert_eq!(
            empty,
            OrderStats {
                total_orders: 0,
                pending_orders: 0,
                delivered_revenue: Money::zero(),
            }
        );

        let p = db.products().insert(&sample("STATS", 1_000, 50)).await.unwrap();
        let delivered = place_order(&db, "u1", &p, 3, None).await;
        place_order(&db, "u2", &p, 1, None).await;
        let orders = db.orders();
        orders.confirm_payment(&delivered.id, "pay", Utc::now()).await.unwrap();
        assert!(orders
            .update_status(&delivered.id, OrderStatus::Confirmed, OrderStatus::Shipped)
            .await
            .unwrap());
        assert!(orders
            .update_status(&delivered.id, OrderStatus::Shipped, OrderStatus::Delivered)
            .await
            .unwrap());

        let stats = orders.stats().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.delivered_revenue.minor(), 3_000);
    }
}
