//! Catalog endpoints.

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

use super::{ApiError, ApiPath, ApiQuery, AppState, CurrentUser, ProductView, ValidatedJson};
use crate::domain::aggregates::{ProductDraft, ProductQuery};
use crate::{ProductId, StorefrontError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination { pub current_page: u32, pub total_pages: u64, pub total_count: u64, pub limit: u32 }

#[derive(Debug, Serialize)]
pub struct ProductList<'a> { pub products: Vec<ProductView<'a>>, pub pagination: Pagination }

pub async fn list_products(State(s): State<AppState>, ApiQuery(q): ApiQuery<ProductQuery>) -> Result<Response, ApiError> {
    let page = s.catalog.list_products(&q).await?;
    let pagination = Pagination { current_page: page.page, total_pages: page.total_pages(), total_count: page.total_count, limit: page.limit };
    Ok(Json(ProductList { products: page.products.iter().map(ProductView::from).collect(), pagination }).into_response())
}

pub async fn get_product(State(s): State<AppState>, ApiPath(id): ApiPath<ProductId>) -> Result<Response, ApiError> {
    let product = s.catalog.find_product(id).await?.ok_or(StorefrontError::ProductNotFound(id))?;
    Ok(Json(ProductView::from(&product)).into_response())
}

pub async fn create_product(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(draft): ValidatedJson<ProductDraft>,
) -> Result<Response, ApiError> {
    let product = s.catalog.create_product(draft).await?;
    tracing::info!(product_id = product.id, created_by = user_id, images = product.gallery.len(), "product created");
    Ok((StatusCode::CREATED, Json(ProductView::from(&product))).into_response())
}
