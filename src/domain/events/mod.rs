//! Domain events
use serde::Serialize;

use crate::{AddressId, CartId, CartItemId, ProductId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Cart(CartEvent),
    Address(AddressEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    Created { cart_id: CartId, user_id: UserId },
    ItemAdded { user_id: UserId, cart_item_id: CartItemId, product_id: ProductId, added: i32, quantity: i32 },
    QuantityUpdated { user_id: UserId, cart_item_id: CartItemId, quantity: i32 },
    ItemRemoved { user_id: UserId, cart_item_id: CartItemId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressEvent {
    Saved { user_id: UserId, address_id: AddressId, is_default: bool },
    Deleted { user_id: UserId, address_id: AddressId },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Cart(CartEvent::Created { .. }) => "storefront.cart.created",
            Self::Cart(CartEvent::ItemAdded { .. }) => "storefront.cart.item_added",
            Self::Cart(CartEvent::QuantityUpdated { .. }) => "storefront.cart.quantity_updated",
            Self::Cart(CartEvent::ItemRemoved { .. }) => "storefront.cart.item_removed",
            Self::Address(AddressEvent::Saved { .. }) => "storefront.address.saved",
            Self::Address(AddressEvent::Deleted { .. }) => "storefront.address.deleted",
        }
    }
}

impl From<CartEvent> for DomainEvent {
    fn from(e: CartEvent) -> Self { Self::Cart(e) }
}

impl From<AddressEvent> for DomainEvent {
    fn from(e: AddressEvent) -> Self { Self::Address(e) }
}
