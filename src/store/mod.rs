//! Persistence ports and their implementations.
//!
//! Every cart/address method takes the owning user id and uses it as a filter, so
//! rows belonging to someone else behave exactly like missing rows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{Address, AddressDraft, CartItem, Product, ProductDraft, ProductPage, ProductQuery, Profile, ProfileUpdate};
use crate::domain::value_objects::Quantity;
use crate::{AddressId, CartId, CartItemId, ProductId, Result, UserId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of resolving a user's cart row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnsuredCart { pub cart_id: CartId, pub created: bool }

/// A cart item row after a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartLine { pub id: CartItemId, pub product_id: ProductId, pub quantity: Quantity }

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage>;

    /// Inserts the product and its gallery rows together.
    async fn create_product(&self, draft: ProductDraft) -> Result<Product>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetches the user's cart id, creating the row on first access.
    /// Concurrent first calls must agree on a single cart.
    async fn ensure_cart(&self, user_id: UserId) -> Result<EnsuredCart>;

    /// Items of one cart with their products and galleries, in insertion order.
    async fn load_items(&self, cart_id: CartId) -> Result<Vec<CartItem>>;

    /// Atomic increment-or-create of the (cart, product) line.
    async fn add_item(&self, cart_id: CartId, product_id: ProductId, quantity: Quantity) -> Result<CartLine>;

    /// Absolute set. `false` when the item is missing or not in the user's cart.
    async fn set_item_quantity(&self, user_id: UserId, item_id: CartItemId, quantity: Quantity) -> Result<bool>;

    /// `false` when the item is missing or not in the user's cart.
    async fn delete_item(&self, user_id: UserId, item_id: CartItemId) -> Result<bool>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>>;

    /// Clears sibling defaults in the same transaction when the draft is default.
    async fn insert_address(&self, user_id: UserId, draft: AddressDraft) -> Result<Address>;

    /// `None` when the address is missing or owned by someone else.
    async fn update_address(&self, user_id: UserId, id: AddressId, draft: AddressDraft) -> Result<Option<Address>>;

    async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<bool>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `None` when the user row is gone.
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<Option<Profile>>;
}

/// Maps a session token to the signed-in user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: Uuid) -> Result<Option<UserId>>;
}
