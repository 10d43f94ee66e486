//! # Cart Repository
//!
//! Persistence for per-user carts.
//!
//! ## Write Model
//! ```text
//! load ──► bites_core::Cart (mutate in memory) ──► save
//!                                                   │
//!                              BEGIN                ▼
//!                              UPSERT carts (user_id UNIQUE)
//!                              DELETE cart_items
//!                              INSERT cart_items (one per line)
//!                              COMMIT
//! ```
//! The whole cart is replaced in one transaction, so a reader never sees a
//! half-written cart and `total_price_cents` always matches the lines that
//! were committed with it. Two concurrent writers for the same user resolve
//! as last-write-wins.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use bites_core::{Cart, CartItem, Money};

#[derive(Debug, FromRow)]
struct CartRow {
    id: String,
    user_id: String,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CartItemRow {
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price_cents),
        }
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads the user's cart, or `None` if they never had one.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, user_id, total_price_cents, created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT product_id, quantity, unit_price_cents
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY position
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Cart {
            user_id: row.user_id,
            items: items.into_iter().map(CartItem::from).collect(),
            total_price: Money::from_minor(row.total_price_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Loads the user's cart or a fresh empty one (not yet persisted).
    pub async fn get_or_new(&self, user_id: &str) -> DbResult<Cart> {
        Ok(self.get(user_id).await?.unwrap_or_else(|| Cart::new(user_id)))
    }

    /// Replaces the stored cart with `cart`, creating it if needed.
    pub async fn save(&self, cart: &Cart) -> DbResult<()> {
        debug!(
            user_id = %cart.user_id,
            lines = cart.items.len(),
            total = cart.total_price.minor(),
            "Saving cart"
        );

        let mut tx = self.pool.begin().await?;

        let cart_id: String = sqlx::query_scalar(
            r#"
            INSERT INTO carts (id, user_id, total_price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id) DO UPDATE SET
                total_price_cents = excluded.total_price_cents,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart.user_id)
        .bind(cart.total_price.minor())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_id, product_id, position, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&cart_id)
            .bind(&item.product_id)
            .bind(position as i64)
            .bind(item.quantity)
            .bind(item.unit_price.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Empties the user's cart if it exists.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        clear_for_user(&mut *conn, user_id).await
    }
}

/// Removes all lines of `user_id`'s cart and zeroes its total.
///
/// Takes a connection so it can run inside a caller's transaction.
pub(crate) async fn clear_for_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        DELETE FROM cart_items
        WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)
        "#,
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE carts SET total_price_cents = 0, updated_at = ?2 WHERE user_id = ?1")
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
