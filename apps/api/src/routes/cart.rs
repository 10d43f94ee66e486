//! Cart routes.
//!
//! ```text
//! load cart ──► Cart::add_item / update_item / remove_item ──► save whole cart
//! ```
//! The whole cart is written in one transaction; concurrent edits of the
//! same cart are last-write-wins.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use bites_core::validation::validate_uuid;
use bites_core::Cart;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// `quantity = 0` removes the line.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: String,
    /// `None` if the product row is gone.
    pub name: Option<String>,
    pub quantity: i64,
    /// Price captured when the line was last touched.
    pub price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CartResponse {
    pub success: bool,
    pub cart: CartView,
}

/// `GET /api/cart`. A user without a cart sees an empty one.
pub async fn view(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<CartResponse>> {
    let cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .unwrap_or_else(|| Cart::new(user.id.as_str()));

    Ok(Json(cart_response(&state, &cart).await?))
}

/// `POST /api/cart/add`
pub async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<Json<CartResponse>> {
    let Json(req) = payload?;
    validate_uuid(&req.product_id, "productId")?;

    let product = state.db.products().get_by_id(&req.product_id).await?;
    let mut cart = state.db.carts().get_or_new(&user.id).await?;

    cart.add_item(&req.product_id, product.as_ref(), req.quantity)?;
    state.db.carts().save(&cart).await?;

    debug!(user_id = %user.id, product_id = %req.product_id, quantity = req.quantity, "Added to cart");
    Ok(Json(cart_response(&state, &cart).await?))
}

/// `PUT /api/cart/update`
pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> ApiResult<Json<CartResponse>> {
    let Json(req) = payload?;
    validate_uuid(&req.product_id, "productId")?;

    let mut cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart"))?;

    let product = if req.quantity > 0 {
        state.db.products().get_by_id(&req.product_id).await?
    } else {
        None
    };

    cart.update_item(&req.product_id, product.as_ref(), req.quantity)?;
    state.db.carts().save(&cart).await?;

    Ok(Json(cart_response(&state, &cart).await?))
}

/// `DELETE /api/cart/remove/{product_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    user: CurrentUser,
    product_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<CartResponse>> {
    let Path(product_id) =
        product_id.map_err(|_| ApiError::bad_request("Invalid product ID"))?;
    validate_uuid(&product_id, "productId").map_err(|_| ApiError::bad_request("Invalid product ID"))?;

    let mut cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart"))?;

    cart.remove_item(&product_id);
    state.db.carts().save(&cart).await?;

    Ok(Json(cart_response(&state, &cart).await?))
}

/// `DELETE /api/cart/clear`
pub async fn clear(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    state.db.carts().clear(&user.id).await?;
    Ok(Json(MessageResponse::ok("Cart cleared")))
}

/// Renders a cart with current product names.
async fn cart_response(state: &AppState, cart: &Cart) -> ApiResult<CartResponse> {
    let ids: Vec<String> = cart.items.iter().map(|i| i.product_id.clone()).collect();
    let names: HashMap<String, String> = state
        .db
        .products()
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let items = cart
        .items
        .iter()
        .map(|line| CartLineView {
            product_id: line.product_id.clone(),
            name: names.get(&line.product_id).cloned(),
            quantity: line.quantity,
            price: line.unit_price.to_f64(),
            line_total: line.line_total().to_f64(),
        })
        .collect();

    Ok(CartResponse {
        success: true,
        cart: CartView {
            items,
            total_price: cart.total_price.to_f64(),
        },
    })
}
