//! Address Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{AddressId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub phone: String,
    pub street: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub zip_code: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Address fields as submitted on create and update.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressDraft {
    #[validate(custom = "not_blank")]
    pub first_name: String,
    #[validate(custom = "not_blank")]
    pub last_name: String,
    pub company: Option<String>,
    #[validate(custom = "not_blank")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub street: String,
    pub street2: Option<String>,
    #[validate(custom = "not_blank")]
    pub city: String,
    pub state: Option<String>,
    #[validate(custom = "not_blank")]
    pub country: String,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

impl Address {
    pub fn from_draft(id: AddressId, user_id: UserId, draft: AddressDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id, user_id,
            first_name: draft.first_name, last_name: draft.last_name, company: draft.company,
            phone: draft.phone, street: draft.street, street2: draft.street2, city: draft.city,
            state: draft.state, country: draft.country, zip_code: draft.zip_code,
            is_default: draft.is_default, created_at,
        }
    }

    pub fn apply(&mut self, draft: AddressDraft) {
        *self = Self::from_draft(self.id, self.user_id, draft, self.created_at);
    }
}

/// Makes `target` the only default among one user's addresses.
pub fn select_default(addresses: &mut [Address], target: AddressId) {
    for address in addresses.iter_mut() {
        address.is_default = address.id == target;
    }
}

/// Default first, then creation order.
pub fn sort_for_listing(addresses: &mut [Address]) {
    addresses.sort_by_key(|a| (!a.is_default, a.id));
}
