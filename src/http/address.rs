//! Address book endpoints.

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiError, ApiPath, AppState, CurrentUser, Message, ValidatedJson};
use crate::domain::aggregates::{Address, AddressDraft};
use crate::AddressId;

pub async fn list_addresses(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Json<Vec<Address>>, ApiError> {
    Ok(Json(s.addresses.list(user_id).await?))
}

pub async fn create_address(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(draft): ValidatedJson<AddressDraft>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let address = s.addresses.create(user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(id): ApiPath<AddressId>,
    ValidatedJson(draft): ValidatedJson<AddressDraft>,
) -> Result<Json<Address>, ApiError> {
    Ok(Json(s.addresses.update(user_id, id, draft).await?))
}

pub async fn delete_address(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<Json<Message>, ApiError> {
    s.addresses.delete(user_id, id).await?;
    Ok(Json(Message { message: "address deleted" }))
}
