//! Coupon routes: the shopper-facing preview and admin management.
//!
//! Amounts arrive as JSON numbers and are converted to fixed-point at this
//! boundary. `discountValue` is rupees for flat coupons and percent for
//! percentage coupons; both are stored in hundredths.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use bites_core::coupon::{self, NewCoupon};
use bites_core::money::{from_fixed_decimal, to_fixed_decimal};
use bites_core::validation::{validate_pagination, validate_preview_amount, validate_search_query, validate_uuid};
use bites_core::{Coupon, CouponStatus, DiscountType, Money, ValidationError};
use bites_db::{CouponListQuery, CouponStatusFilter};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::routes::MessageResponse;
use crate::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// Admin view of a coupon.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Rupees (flat) or percent (percentage).
    pub discount_value: f64,
    pub min_order_value: f64,
    pub max_discount: Option<f64>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    pub max_uses: Option<i64>,
    pub used_count: i64,
    pub is_active: bool,
    pub status: CouponStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CouponView {
    fn new(coupon: Coupon, now: DateTime<Utc>) -> Self {
        CouponView {
            status: coupon.status_at(now),
            discount_value: Money::from_minor(coupon.discount_value).to_f64(),
            min_order_value: coupon.min_order_value.to_f64(),
            max_discount: coupon.max_discount.map(|m| m.to_f64()),
            id: coupon.id,
            code: coupon.code,
            description: coupon.description,
            discount_type: coupon.discount_type,
            valid_from: coupon.valid_from,
            valid_until: coupon.valid_until,
            max_uses: coupon.max_uses,
            used_count: coupon.used_count,
            is_active: coupon.is_active,
            created_at: coupon.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(default)]
    pub min_order_value: Option<f64>,
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CreateCouponRequest {
    fn into_new_coupon(self) -> ApiResult<NewCoupon> {
        let max_discount = self.max_discount.map(to_fixed_decimal).transpose()?;

        Ok(NewCoupon {
            code: self.code,
            description: self.description.filter(|d| !d.trim().is_empty()),
            discount_type: self.discount_type,
            discount_value: to_fixed_decimal(self.discount_value)?.minor(),
            min_order_value: to_fixed_decimal(self.min_order_value.unwrap_or(0.0))?,
            max_discount,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            max_uses: self.max_uses,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CouponResponse {
    pub success: bool,
    pub coupon: CouponView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCouponsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    /// all | active | expired | upcoming
    #[serde(default)]
    pub status: Option<CouponStatusFilter>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponPageView {
    pub coupons: Vec<CouponView>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CouponListResponse {
    pub success: bool,
    pub data: CouponPageView,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct ApplyCouponRequest {
    pub code: String,
    /// Order amount to preview against.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponResponse {
    pub success: bool,
    pub discount: f64,
    pub discounted_amount: f64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/coupons/apply`. Previews a coupon; nothing is redeemed.
pub async fn apply(
    State(state): State<AppState>,
    _user: CurrentUser,
    payload: Result<Json<ApplyCouponRequest>, JsonRejection>,
) -> ApiResult<Json<ApplyCouponResponse>> {
    let Json(req) = payload?;

    if req.code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        }
        .into());
    }
    let amount = to_fixed_decimal(req.amount)?;
    validate_preview_amount(amount)?;

    let found = state.db.coupons().get_by_code(&req.code).await?;
    let application = coupon::evaluate(&req.code, found.as_ref(), amount, Utc::now())?;

    Ok(Json(ApplyCouponResponse {
        success: true,
        discount: from_fixed_decimal(Some(application.discount)),
        discounted_amount: application.discounted(amount).to_f64(),
    }))
}

/// `GET /api/coupons` (admin)
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    params: Result<Query<ListCouponsParams>, QueryRejection>,
) -> ApiResult<Json<CouponListResponse>> {
    let Query(params) = params?;
    let (page, limit) = validate_pagination(params.page, params.limit)?;
    let search = validate_search_query(params.search.as_deref().unwrap_or(""))?;

    let now = Utc::now();
    let result = state
        .db
        .coupons()
        .list(
            &CouponListQuery {
                page,
                limit,
                search,
                status: params.status.unwrap_or_default(),
            },
            now,
        )
        .await?;

    Ok(Json(CouponListResponse {
        success: true,
        data: CouponPageView {
            coupons: result
                .coupons
                .into_iter()
                .map(|c| CouponView::new(c, now))
                .collect(),
            page: result.page,
            limit: result.limit,
            total_items: result.total_items,
            total_pages: result.total_pages,
        },
    }))
}

/// `POST /api/coupons` (admin)
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateCouponRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CouponResponse>)> {
    let Json(req) = payload?;

    let mut input = req.into_new_coupon()?;
    input.validate()?;

    let created = state.db.coupons().insert(&input).await?;
    info!(code = %created.code, admin_id = %admin.id, "Coupon created");

    Ok((
        StatusCode::CREATED,
        Json(CouponResponse {
            success: true,
            coupon: CouponView::new(created, Utc::now()),
        }),
    ))
}

/// `DELETE /api/coupons/{id}` (admin). Soft delete.
pub async fn deactivate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid coupon ID"))?;
    validate_uuid(&id, "couponId").map_err(|_| ApiError::bad_request("Invalid coupon ID"))?;

    state.db.coupons().deactivate(&id).await?;
    info!(coupon_id = %id, admin_id = %admin.id, "Coupon deactivated");

    Ok(Json(MessageResponse::ok("Coupon deactivated successfully")))
}
