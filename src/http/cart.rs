//! Cart endpoints.

use axum::{extract::State, response::{IntoResponse, Response}, Json};
use serde::Deserialize;
use validator::Validate;

use super::{ApiError, ApiPath, AppState, CartView, CurrentUser, Message, ValidatedJson};
use crate::{CartItemId, ProductId};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub quantity: i64,
}

pub async fn get_cart(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Response, ApiError> {
    let cart = s.carts.get_or_create_cart(user_id).await?;
    Ok(Json(CartView::from(&cart)).into_response())
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(r): ValidatedJson<AddToCartRequest>,
) -> Result<Response, ApiError> {
    let cart = s.carts.add_item(user_id, r.product_id, r.quantity).await?;
    Ok(Json(CartView::from(&cart)).into_response())
}

pub async fn update_quantity(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(cart_item_id): ApiPath<CartItemId>,
    ValidatedJson(r): ValidatedJson<UpdateQuantityRequest>,
) -> Result<Json<Message>, ApiError> {
    s.carts.update_item_quantity(user_id, cart_item_id, r.quantity).await?;
    Ok(Json(Message { message: "quantity updated" }))
}

pub async fn remove_item(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(cart_item_id): ApiPath<CartItemId>,
) -> Result<Json<Message>, ApiError> {
    s.carts.remove_item(user_id, cart_item_id).await?;
    Ok(Json(Message { message: "item removed from cart" }))
}
