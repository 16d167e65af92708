//! Storefront backend
//!
//! Server side of a small clothing storefront.
//!
//! ## Features
//! - Product catalog browsing with discounts and galleries, and product creation
//! - Customer profile contact details
//! - Per-user shopping cart (merge-on-add, absolute quantity updates)
//! - Address book with a single default address per user
//! - Cart/address domain events published to NATS

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod http;
pub mod publisher;
pub mod service;
pub mod store;

// =============================================================================
// Identifiers
// =============================================================================

pub type UserId = i64;
pub type ProductId = i64;
pub type CartId = i64;
pub type CartItemId = i64;
pub type AddressId = i64;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("authentication required")]
    Unauthorized,

    /// Also returned for items owned by another user.
    #[error("cart item not found")]
    CartItemNotFound,

    #[error("address not found")]
    AddressNotFound,

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StorefrontError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }
}

impl From<sqlx::Error> for StorefrontError {
    fn from(err: sqlx::Error) -> Self {
        // 22003: numeric_value_out_of_range, e.g. an accumulated quantity past INT.
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("22003") {
                return Self::validation("quantity", "quantity is too large");
            }
        }
        Self::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors.field_errors();
        let mut names: Vec<&'static str> = fields.keys().copied().collect();
        names.sort_unstable();
        let Some(field) = names.first().copied() else {
            return Self::validation("body", "invalid request");
        };
        let message = fields[field]
            .first()
            .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "is invalid".to_string());
        Self::Validation { field, message }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
