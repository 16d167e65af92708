//! Customer profile

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::UserId;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
}

/// Contact fields a customer may change. Absent or blank fields keep the stored value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[validate(length(max = 32, message = "is too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "is too long"))]
    pub address: Option<String>,
    #[validate(length(max = 255, message = "is too long"))]
    pub company: Option<String>,
}

impl ProfileUpdate {
    /// Drops blank values so they read as "not supplied".
    pub fn present(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self { phone: keep(self.phone), address: keep(self.address), company: keep(self.company) }
    }
}

impl Profile {
    pub fn apply(&mut self, update: ProfileUpdate) {
        let update = update.present();
        if update.phone.is_some() { self.phone = update.phone; }
        if update.address.is_some() { self.address = update.address; }
        if update.company.is_some() { self.company = update.company; }
    }
}
