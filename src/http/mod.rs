//! HTTP surface.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::{Cart, CartItem, GalleryImage, Product};
use crate::publisher::EventPublisher;
use crate::service::{AddressService, CartService};
use crate::store::{AddressStore, CartStore, CatalogStore, IdentityResolver, ProfileStore};
use crate::{CartId, CartItemId, ProductId};

pub mod address;
pub mod cart;
pub mod error;
pub mod extract;
pub mod products;
pub mod profile;

pub use error::ApiError;
pub use extract::{ApiPath, ApiQuery, CurrentUser, ValidatedJson};

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub carts: CartService,
    pub addresses: AddressService,
    pub catalog: Arc<dyn CatalogStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, events: EventPublisher) -> Self
    where
        S: CartStore + AddressStore + CatalogStore + ProfileStore + IdentityResolver + 'static,
    {
        Self {
            carts: CartService::new(store.clone(), store.clone(), events.clone()),
            addresses: AddressService::new(store.clone(), events),
            catalog: store.clone(),
            profiles: store.clone(),
            identity: store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/products", get(products::list_products).post(products::create_product))
        .route("/products/:id", get(products::get_product))
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart))
        .route("/cart/:cart_item_id", axum::routing::patch(cart::update_quantity).put(cart::update_quantity).delete(cart::remove_item))
        .route("/address", get(address::list_addresses).post(address::create_address))
        .route("/address/:id", axum::routing::put(address::update_address).delete(address::delete_address))
        .route("/profile", axum::routing::put(profile::update_profile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Response views
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub effective_price: i64,
    pub main_image: Option<&'a GalleryImage>,
    pub hover_image: Option<&'a GalleryImage>,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self { product, effective_price: product.effective_price(), main_image: product.main_image(), hover_image: product.hover_image() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView<'a> {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub line_total: i64,
    pub product: ProductView<'a>,
}

impl<'a> From<&'a CartItem> for CartItemView<'a> {
    fn from(item: &'a CartItem) -> Self {
        Self {
            id: item.id, cart_id: item.cart_id, product_id: item.product_id,
            quantity: item.quantity.value(), line_total: item.line_total(), product: (&item.product).into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView<'a> {
    pub cart_items: Vec<CartItemView<'a>>,
    pub total_quantity: i64,
    pub total_price: i64,
}

impl<'a> From<&'a Cart> for CartView<'a> {
    fn from(cart: &'a Cart) -> Self {
        let aggregate = cart.aggregate();
        Self {
            cart_items: cart.items().iter().map(CartItemView::from).collect(),
            total_quantity: aggregate.total_quantity,
            total_price: aggregate.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message { pub message: &'static str }
