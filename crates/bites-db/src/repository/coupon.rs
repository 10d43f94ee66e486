//! # Coupon Repository
//!
//! Coupon lookup for the evaluator, admin management and redemption.
//!
//! ## Redemption
//! ```text
//! UPDATE coupons SET used_count = used_count + 1
//! WHERE code = ? AND (max_uses IS NULL OR used_count < max_uses)
//!
//! 1 row  → redeemed
//! 0 rows → cap reached since the order was priced (reported, not fatal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{like_pattern, offset, total_pages};
use bites_core::coupon::{normalize_code, NewCoupon};
use bites_core::{Coupon, DiscountType, Money};

const COUPON_COLUMNS: &str = r#"
    id, code, description, discount_type, discount_value,
    min_order_value_cents, max_discount_cents, valid_from, valid_until,
    max_uses, used_count, is_active, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct CouponRow {
    id: String,
    code: String,
    description: Option<String>,
    discount_type: DiscountType,
    discount_value: i64,
    min_order_value_cents: i64,
    max_discount_cents: Option<i64>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    max_uses: Option<i64>,
    used_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Coupon {
            id: row.id,
            code: row.code,
            description: row.description,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            min_order_value: Money::from_minor(row.min_order_value_cents),
            max_discount: row.max_discount_cents.map(Money::from_minor),
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            max_uses: row.max_uses,
            used_count: row.used_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Admin listing filter, relative to "now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatusFilter {
    #[default]
    All,
    /// Active and inside its validity window.
    Active,
    /// Past `valid_until`, or deactivated.
    Expired,
    /// `valid_from` still in the future.
    Upcoming,
}

/// Admin listing parameters.
#[derive(Debug, Clone)]
pub struct CouponListQuery {
    pub page: i64,
    pub limit: i64,
    /// Case-insensitive substring of code or description; empty matches all.
    pub search: String,
    pub status: CouponStatusFilter,
}

/// One page of coupons.
#[derive(Debug, Clone)]
pub struct CouponPage {
    pub coupons: Vec<Coupon>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Looks up a coupon by code (case-insensitive), regardless of status.
    ///
    /// Applicability is decided by `bites_core::coupon::evaluate`.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1"
        ))
        .bind(normalize_code(code))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }

    /// Inserts a validated coupon with `used_count = 0`.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the code already exists.
    pub async fn insert(&self, input: &NewCoupon) -> DbResult<Coupon> {
        let now = Utc::now();
        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: normalize_code(&input.code),
            description: input.description.clone(),
            discount_type: input.discount_type,
            discount_value: input.discount_value,
            min_order_value: input.min_order_value,
            max_discount: input.max_discount,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            max_uses: input.max_uses,
            used_count: 0,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, description, discount_type, discount_value,
                min_order_value_cents, max_discount_cents, valid_from, valid_until,
                max_uses, used_count, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.min_order_value.minor())
        .bind(coupon.max_discount.map(|m| m.minor()))
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.max_uses)
        .bind(coupon.used_count)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &coupon.code),
            other => other,
        })?;

        Ok(coupon)
    }

    /// Lists coupons newest first with search and status filtering.
    pub async fn list(&self, query: &CouponListQuery, now: DateTime<Utc>) -> DbResult<CouponPage> {
        let pattern = like_pattern(&query.search);

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM coupons");
        push_filters(&mut count, &pattern, query.status, now);
        let total_items: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COUPON_COLUMNS} FROM coupons"));
        push_filters(&mut select, &pattern, query.status, now);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(offset(query.page, query.limit));

        let rows = select
            .build_query_as::<CouponRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(CouponPage {
            coupons: rows.into_iter().map(Coupon::from).collect(),
            page: query.page,
            limit: query.limit,
            total_items,
            total_pages: total_pages(total_items, query.limit),
        })
    }

    /// Soft-deletes a coupon (`is_active = false`).
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }

    /// Records one redemption if the usage cap allows it.
    pub async fn redeem(&self, code: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        redeem_in(&mut *conn, code).await
    }
}

/// Appends the WHERE clause shared by the count and page queries.
fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    pattern: &str,
    status: CouponStatusFilter,
    now: DateTime<Utc>,
) {
    builder
        .push(" WHERE (LOWER(code) LIKE ")
        .push_bind(pattern.to_string())
        .push(r" ESCAPE '\' OR LOWER(COALESCE(description, '')) LIKE ")
        .push_bind(pattern.to_string())
        .push(r" ESCAPE '\')");

    match status {
        CouponStatusFilter::All => {}
        CouponStatusFilter::Active => {
            builder
                .push(" AND is_active = 1 AND valid_from <= ")
                .push_bind(now)
                .push(" AND valid_until >= ")
                .push_bind(now);
        }
        CouponStatusFilter::Expired => {
            builder
                .push(" AND (valid_until < ")
                .push_bind(now)
                .push(" OR is_active = 0)");
        }
        CouponStatusFilter::Upcoming => {
            builder.push(" AND valid_from > ").push_bind(now);
        }
    }
}

/// Guarded `used_count += 1`, usable inside a transaction.
pub(crate) async fn redeem_in(conn: &mut SqliteConnection, code: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE coupons
        SET used_count = used_count + 1, updated_at = ?2
        WHERE code = ?1 AND (max_uses IS NULL OR used_count < max_uses)
        "#,
    )
    .bind(normalize_code(code))
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::Duration;

    pub fn new_coupon(code: &str, bps: i64, max_uses: Option<i64>) -> NewCoupon {
        let now = Utc::now();
        NewCoupon {
            code: code.to_string(),
            description: Some(format!("{code} promo")),
            discount_type: DiscountType::Percentage,
            discount_value: bps,
            min_order_value: Money::zero(),
            max_discount: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            max_uses,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_case_insensitive() {
        let db = test_support::db().await;
        let repo = db.coupons();
        let created = repo.insert(&new_coupon("save10", 1000, None)).await.unwrap();
        assert_eq!(created.code, "SAVE10");
        assert_eq!(created.used_count, 0);

        let found = repo.get_by_code(" Save10 ").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.discount_type, DiscountType::Percentage);
        assert_eq!(found.discount_value, 1000);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = test_support::db().await;
        let repo = db.coupons();
        repo.insert(&new_coupon("SAVE10", 1000, None)).await.unwrap();

        let err = repo.insert(&new_coupon("save10", 500, None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "SAVE10"));
    }

    #[tokio::test]
    async fn test_redeem_respects_cap() {
        let db = test_support::db().await;
        let repo = db.coupons();
        repo.insert(&new_coupon("ONCE", 1000, Some(1))).await.unwrap();
        repo.insert(&new_coupon("FOREVER", 1000, None)).await.unwrap();

        assert!(repo.redeem("once").await.unwrap());
        assert!(!repo.redeem("ONCE").await.unwrap());
        assert_eq!(repo.get_by_code("ONCE").await.unwrap().unwrap().used_count, 1);

        for _ in 0..3 {
            assert!(repo.redeem("FOREVER").await.unwrap());
        }
        assert_eq!(repo.get_by_code("FOREVER").await.unwrap().unwrap().used_count, 3);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_support::db().await;
        let repo = db.coupons();
        let now = Utc::now();

        repo.insert(&new_coupon("ACTIVE1", 1000, None)).await.unwrap();

        let mut expired = new_coupon("OLD", 1000, None);
        expired.valid_from = now - Duration::days(10);
        expired.valid_until = now - Duration::days(5);
        repo.insert(&expired).await.unwrap();

        let mut upcoming = new_coupon("SOON", 1000, None);
        upcoming.valid_from = now + Duration::days(5);
        upcoming.valid_until = now + Duration::days(10);
        repo.insert(&upcoming).await.unwrap();

        let off = repo.insert(&new_coupon("OFF", 1000, None)).await.unwrap();
        repo.deactivate(&off.id).await.unwrap();

        let list = |status, search: &str| CouponListQuery {
            page: 1,
            limit: 10,
            search: search.to_string(),
            status,
        };

        let all = repo.list(&list(CouponStatusFilter::All, ""), now).await.unwrap();
        assert_eq!(all.total_items, 4);

        let active = repo.list(&list(CouponStatusFilter::Active, ""), now).await.unwrap();
        assert_eq!(active.coupons.len(), 1);
        assert_eq!(active.coupons[0].code, "ACTIVE1");

        let expired = repo.list(&list(CouponStatusFilter::Expired, ""), now).await.unwrap();
        assert_eq!(expired.total_items, 2);

        let upcoming = repo.list(&list(CouponStatusFilter::Upcoming, ""), now).await.unwrap();
        assert_eq!(upcoming.coupons[0].code, "SOON");

        let searched = repo.list(&list(CouponStatusFilter::All, "soon promo"), now).await.unwrap();
        assert_eq!(searched.total_items, 1);
    }

    #[tokio::test]
    async fn test_deactivate_missing() {
        let db = test_support::db().await;
        assert!(matches!(
            db.coupons().deactivate("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
