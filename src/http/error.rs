//! JSON error responses.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::StorefrontError;

#[derive(Debug)]
pub struct ApiError(pub StorefrontError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self { Self(err) }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(StorefrontError::validation("path", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(StorefrontError::validation("query", rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StorefrontError::Validation { .. } => StatusCode::BAD_REQUEST,
            StorefrontError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorefrontError::CartItemNotFound | StorefrontError::AddressNotFound | StorefrontError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            StorefrontError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            StorefrontError::Validation { field, message } => ErrorBody { error: "VALIDATION_ERROR", message, field: Some(field) },
            StorefrontError::Unauthorized => ErrorBody { error: "UNAUTHORIZED", message: "authentication required".into(), field: None },
            StorefrontError::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                ErrorBody { error: "INTERNAL_ERROR", message: "operation failed, please retry".into(), field: None }
            }
            other => ErrorBody { error: "NOT_FOUND", message: other.to_string(), field: None },
        };
        (status, Json(body)).into_response()
    }
}
