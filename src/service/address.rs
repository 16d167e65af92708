//! Address book with single-default selection.

use std::sync::Arc;

use validator::Validate;

use crate::domain::aggregates::{Address, AddressDraft};
use crate::domain::events::AddressEvent;
use crate::publisher::EventPublisher;
use crate::store::AddressStore;
use crate::{AddressId, Result, StorefrontError, UserId};

#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
    events: EventPublisher,
}

impl AddressService {
    pub fn new(addresses: Arc<dyn AddressStore>, events: EventPublisher) -> Self { Self { addresses, events } }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>> {
        self.addresses.list_addresses(user_id).await
    }

    #[tracing::instrument(skip(self, draft), fields(is_default = draft.is_default))]
    pub async fn create(&self, user_id: UserId, draft: AddressDraft) -> Result<Address> {
        draft.validate()?;
        let address = self.addresses.insert_address(user_id, draft).await?;
        self.saved(&address).await;
        Ok(address)
    }

    #[tracing::instrument(skip(self, draft), fields(is_default = draft.is_default))]
    pub async fn update(&self, user_id: UserId, id: AddressId, draft: AddressDraft) -> Result<Address> {
        draft.validate()?;
        let address = self.addresses.update_address(user_id, id, draft).await?.ok_or(StorefrontError::AddressNotFound)?;
        self.saved(&address).await;
        Ok(address)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<()> {
        if !self.addresses.delete_address(user_id, id).await? {
            return Err(StorefrontError::AddressNotFound);
        }
        self.events.publish(AddressEvent::Deleted { user_id, address_id: id }).await;
        Ok(())
    }

    async fn saved(&self, address: &Address) {
        self.events.publish(AddressEvent::Saved { user_id: address.user_id, address_id: address.id, is_default: address.is_default }).await;
    }
}
