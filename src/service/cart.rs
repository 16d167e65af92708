//! Cart lifecycle for signed-in users.

use std::sync::Arc;

use crate::domain::aggregates::Cart;
use crate::domain::events::CartEvent;
use crate::domain::value_objects::Quantity;
use crate::publisher::EventPublisher;
use crate::store::{CartStore, CatalogStore};
use crate::{CartItemId, ProductId, Result, StorefrontError, UserId};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    events: EventPublisher,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>, events: EventPublisher) -> Self {
        Self { carts, catalog, events }
    }

    /// The user's cart with items, products and galleries; created empty on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        let ensured = self.carts.ensure_cart(user_id).await?;
        if ensured.created {
            tracing::debug!(cart_id = ensured.cart_id, "created cart");
            self.events.publish(CartEvent::Created { cart_id: ensured.cart_id, user_id }).await;
        }
        let items = self.carts.load_items(ensured.cart_id).await?;
        Ok(Cart { id: ensured.cart_id, user_id, items })
    }

    /// Adds `quantity` on top of any existing line for the product.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<Cart> {
        let quantity = Quantity::new(quantity)?;
        if self.catalog.find_product(product_id).await?.is_none() {
            return Err(StorefrontError::ProductNotFound(product_id));
        }
        let ensured = self.carts.ensure_cart(user_id).await?;
        if ensured.created {
            self.events.publish(CartEvent::Created { cart_id: ensured.cart_id, user_id }).await;
        }
        let line = self.carts.add_item(ensured.cart_id, product_id, quantity).await?;
        tracing::info!(cart_item_id = line.id, quantity = line.quantity.value(), "added to cart");
        self.events.publish(CartEvent::ItemAdded {
            user_id,
            cart_item_id: line.id,
            product_id,
            added: quantity.value(),
            quantity: line.quantity.value(),
        }).await;
        let items = self.carts.load_items(ensured.cart_id).await?;
        Ok(Cart { id: ensured.cart_id, user_id, items })
    }

    /// Sets the quantity outright; items outside the user's cart are reported missing.
    #[tracing::instrument(skip(self))]
    pub async fn update_item_quantity(&self, user_id: UserId, cart_item_id: CartItemId, quantity: i64) -> Result<()> {
        let quantity = Quantity::new(quantity)?;
        if !self.carts.set_item_quantity(user_id, cart_item_id, quantity).await? {
            return Err(StorefrontError::CartItemNotFound);
        }
        self.events.publish(CartEvent::QuantityUpdated { user_id, cart_item_id, quantity: quantity.value() }).await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, cart_item_id: CartItemId) -> Result<()> {
        if !self.carts.delete_item(user_id, cart_item_id).await? {
            return Err(StorefrontError::CartItemNotFound);
        }
        self.events.publish(CartEvent::ItemRemoved { user_id, cart_item_id }).await;
        Ok(())
    }
}
