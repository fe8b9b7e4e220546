use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use slicehouse_core::{DomainError, DomainResult, FranchiseId, MenuItemId, OrderId, StoreId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub diner_id: UserId,
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: f64,
}

/// Order placement request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: f64,
}

impl NewOrder {
    pub fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        if self.items.iter().any(|i| !i.price.is_finite() || i.price < 0.0) {
            return Err(DomainError::validation("item price must be a non-negative number"));
        }
        Ok(())
    }
}

/// One page of a diner's order history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub diner_id: UserId,
    pub orders: Vec<Order>,
    pub page: u32,
}

/// A persisted order plus the factory's receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub jwt: String,
    pub report_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_client_payload() {
        let order: NewOrder = serde_json::from_value(serde_json::json!({
            "franchiseId": 1,
            "storeId": 1,
            "items": [{ "menuId": 1, "description": "Veggie", "price": 0.05 }]
        }))
        .unwrap();
        assert_eq!(order.items[0].menu_id, MenuItemId::new(1));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn empty_order_is_rejected() {
        let order = NewOrder {
            franchise_id: FranchiseId::new(1),
            store_id: StoreId::new(1),
            items: vec![],
        };
        assert!(order.validate().is_err());
    }
}
