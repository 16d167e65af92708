//! Cart Aggregate

use serde::Serialize;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Quantity;
use crate::{CartId, CartItemId, ProductId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

/// One line per (cart, product).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product: Product,
}

impl CartItem {
    pub fn unit_price(&self) -> i64 { self.product.effective_price() }
    pub fn line_total(&self) -> i64 { self.unit_price().saturating_mul(i64::from(self.quantity.value())) }
}

/// Totals derived from a cart's line items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAggregate { pub total_quantity: i64, pub total_price: i64 }

impl Cart {
    pub fn empty(id: CartId, user_id: UserId) -> Self { Self { id, user_id, items: vec![] } }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn aggregate(&self) -> CartAggregate { compute_aggregate(&self.items) }
}

pub fn compute_aggregate(items: &[CartItem]) -> CartAggregate {
    items.iter().fold(CartAggregate::default(), |acc, item| CartAggregate {
        total_quantity: acc.total_quantity + i64::from(item.quantity.value()),
        total_price: acc.total_price.saturating_add(item.line_total()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: ProductId, price: i64, discount: Option<i32>) -> Product {
        Product {
            id, title: format!("P{id}"), description: None, price, discount, thumbnail: None,
            colors: vec![], sizes: vec![], category_id: None, created_at: Utc::now(), gallery: vec![],
        }
    }

    fn item(id: CartItemId, product: Product, quantity: i64) -> CartItem {
        CartItem { id, cart_id: 1, product_id: product.id, quantity: Quantity::new(quantity).unwrap(), product }
    }

    #[test]
    fn test_empty_cart_aggregate() {
        let cart = Cart::empty(1, 42);
        assert!(cart.is_empty());
        assert_eq!(cart.aggregate(), CartAggregate { total_quantity: 0, total_price: 0 });
    }

    #[test]
    fn test_aggregate_uses_effective_price() {
        let mut cart = Cart::empty(1, 42);
        cart.items.push(item(1, product(5, 100_000, Some(10)), 2));
        cart.items.push(item(2, product(6, 35_000, None), 3));
        let agg = cart.aggregate();
        assert_eq!(agg.total_quantity, 5);
        assert_eq!(agg.total_price, 90_000 * 2 + 35_000 * 3);
        assert_eq!(cart.items()[1].line_total(), 105_000);
    }

    #[test]
    fn test_aggregate_serializes_camel_case() {
        let json = serde_json::to_value(CartAggregate { total_quantity: 2, total_price: 180_000 }).unwrap();
        assert_eq!(json, serde_json::json!({"totalQuantity": 2, "totalPrice": 180000}));
    }
}
