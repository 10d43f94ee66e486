//! Admin order management and dashboard figures.
//!
//! ## Status updates
//! ```text
//! load order ──► OrderStatus::transition(next, payment_status)
//!                      │ rejected ──► 400
//!                      ▼
//!      UPDATE ... WHERE order_status = <status just read>
//!                      │ 0 rows (changed concurrently) ──► 400
//!                      ▼
//!                 updated order
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use bites_core::validation::{validate_pagination, validate_search_query};
use bites_core::{CoreError, OrderStatus};
use bites_db::OrderListQuery;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::routes::orders::{order_id, OrderResponse, OrderView};
use crate::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageView {
    pub orders: Vec<OrderView>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct AdminOrderListResponse {
    pub success: bool,
    pub data: OrderPageView,
}

/// Store-wide counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of delivered order totals.
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DashboardStatsResponse {
    pub success: bool,
    pub data: DashboardStats,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// `GET /api/admin/dashboard/stats`
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<DashboardStatsResponse>> {
    let products = state.db.products();
    let total_products = products.count().await?;
    let active_products = products.count_active().await?;
    let orders = state.db.orders().stats().await?;

    Ok(Json(DashboardStatsResponse {
        success: true,
        data: DashboardStats {
            total_products,
            active_products,
            total_orders: orders.total_orders,
            pending_orders: orders.pending_orders,
            total_revenue: orders.delivered_revenue.to_f64(),
        },
    }))
}

/// `GET /api/admin/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> ApiResult<Json<AdminOrderListResponse>> {
    let Query(params) = params?;
    let (page, limit) = validate_pagination(params.page, params.limit)?;
    let search = validate_search_query(params.search.as_deref().unwrap_or(""))?;

    let result = state
        .db
        .orders()
        .list(&OrderListQuery {
            page,
            limit,
            status: params.status,
            search,
        })
        .await?;

    Ok(Json(AdminOrderListResponse {
        success: true,
        data: OrderPageView {
            orders: result.orders.into_iter().map(OrderView::from).collect(),
            page: result.page,
            limit: result.limit,
            total_items: result.total_items,
            total_pages: result.total_pages,
        },
    }))
}

/// `PUT /api/admin/orders/{id}/status`
pub async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let id = order_id(id)?;
    let Json(req) = payload?;

    let orders = state.db.orders();
    let order = orders
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.clone()))?;

    let from = order.order_status;
    let to = from.transition(req.status, order.payment_status)?;

    if !orders.update_status(&id, from, to).await? {
        return Err(CoreError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into());
    }

    info!(order_id = %id, admin_id = %admin.id, %from, %to, "Order status updated");

    let updated = orders
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::OrderNotFound(id))?;

    Ok(Json(OrderResponse {
        success: true,
        order: OrderView::from(updated),
    }))
}
