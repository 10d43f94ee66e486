//! Catalog routes. Reads are public, writes need an admin token.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use bites_core::money::to_fixed_decimal;
use bites_core::validation::{
    validate_pagination, validate_price, validate_product_name, validate_search_query, validate_sku,
    validate_stock, validate_uuid,
};
use bites_core::{CoreError, Product};

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            price: p.price.to_f64(),
            id: p.id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            stock: p.stock,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ProductResponse {
    pub success: bool,
    pub product: ProductView,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageView {
    pub products: Vec<ProductView>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ProductListResponse {
    pub success: bool,
    pub data: ProductPageView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// `GET /api/products`: active products, newest first.
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListProductsParams>, QueryRejection>,
) -> ApiResult<Json<ProductListResponse>> {
    let Query(params) = params?;
    let (page, limit) = validate_pagination(params.page, params.limit)?;
    let search = validate_search_query(params.search.as_deref().unwrap_or(""))?;

    let result = state.db.products().list_active(page, limit, &search).await?;

    Ok(Json(ProductListResponse {
        success: true,
        data: ProductPageView {
            products: result.products.into_iter().map(ProductView::from).collect(),
            page: result.page,
            limit: result.limit,
            total_items: result.total_items,
            total_pages: result.total_pages,
        },
    }))
}

/// `GET /api/products/{id}`. Deactivated products are not found.
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let id = product_id(id)?;

    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(CoreError::ProductUnavailable(id))?;

    Ok(Json(ProductResponse {
        success: true,
        product: ProductView::from(product),
    }))
}

/// `POST /api/products` (admin)
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let Json(req) = payload?;

    let sku = req.sku.trim().to_string();
    let name = req.name.trim().to_string();
    let price = to_fixed_decimal(req.price)?;
    validate_sku(&sku)?;
    validate_product_name(&name)?;
    validate_price(price)?;
    validate_stock(req.stock)?;

    let now = Utc::now();
    let product = state
        .db
        .products()
        .insert(&Product {
            id: Uuid::new_v4().to_string(),
            sku,
            name,
            description: req.description.filter(|d| !d.trim().is_empty()),
            price,
            stock: req.stock,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
        .await?;

    info!(product_id = %product.id, sku = %product.sku, admin_id = %admin.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product: ProductView::from(product),
        }),
    ))
}

/// `PUT /api/products/{id}` (admin). Stock is an absolute write.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let id = product_id(id)?;
    let Json(req) = payload?;

    let products = state.db.products();
    let mut product = products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductUnavailable(id.clone()))?;

    if let Some(sku) = req.sku {
        let sku = sku.trim().to_string();
        validate_sku(&sku)?;
        product.sku = sku;
    }
    if let Some(name) = req.name {
        let name = name.trim().to_string();
        validate_product_name(&name)?;
        product.name = name;
    }
    if let Some(description) = req.description {
        product.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(price) = req.price {
        let price = to_fixed_decimal(price)?;
        validate_price(price)?;
        product.price = price;
    }
    if let Some(stock) = req.stock {
        validate_stock(stock)?;
        product.stock = stock;
    }
    if let Some(is_active) = req.is_active {
        product.is_active = is_active;
    }
    product.updated_at = Utc::now();

    products.update(&product).await?;
    info!(product_id = %id, admin_id = %admin.id, "Product updated");

    Ok(Json(ProductResponse {
        success: true,
        product: ProductView::from(product),
    }))
}

/// `DELETE /api/products/{id}` (admin). Soft delete.
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = product_id(id)?;

    state.db.products().soft_delete(&id).await?;
    info!(product_id = %id, admin_id = %admin.id, "Product deactivated");

    Ok(Json(MessageResponse::ok("Product deactivated successfully")))
}

fn product_id(id: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid product ID"))?;
    validate_uuid(&id, "productId").map_err(|_| ApiError::bad_request("Invalid product ID"))?;
    Ok(id)
}
