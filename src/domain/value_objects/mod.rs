//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StorefrontError;

/// Line item quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::NotPositive); }
        i32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge)
    }

    pub fn value(&self) -> i32 { self.0 }

    pub fn checked_add(&self, other: Quantity) -> Result<Self, QuantityError> {
        self.0.checked_add(other.0).map(Self).ok_or(QuantityError::TooLarge)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> i32 { q.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { NotPositive, TooLarge }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive => write!(f, "quantity must be a positive integer"),
            Self::TooLarge => write!(f, "quantity is too large"),
        }
    }
}

impl From<QuantityError> for StorefrontError {
    fn from(err: QuantityError) -> Self { StorefrontError::validation("quantity", err.to_string()) }
}

/// Percentage discount, clamped to `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount(u8);

impl Discount {
    pub fn new(percent: i32) -> Self { Self(percent.clamp(0, 100) as u8) }
    pub fn percent(&self) -> u8 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }

    /// `round(price * (100 - percent) / 100)`, rounding halves up.
    pub fn apply(&self, price: i64) -> i64 {
        if self.is_zero() { return price; }
        let scaled = i128::from(price) * i128::from(100 - self.0);
        let rounded = (scaled + 50).div_euclid(100);
        i64::try_from(rounded).unwrap_or(i64::MAX)
    }
}

/// Price after the optional percentage discount.
pub fn effective_price(price: i64, discount: Option<i32>) -> i64 {
    match discount {
        Some(percent) => Discount::new(percent).apply(price),
        None => price,
    }
}
