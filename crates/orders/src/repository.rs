use async_trait::async_trait;

use slicehouse_auth::StoreError;
use slicehouse_core::{MenuItemId, UserId};

use crate::{MenuItem, NewMenuItem, NewOrder, Order};

/// Persistence contract for the menu and diner orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn menu(&self) -> Result<Vec<MenuItem>, StoreError>;

    async fn find_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError>;

    /// `item` has already been validated.
    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError>;

    /// Orders of `diner`, newest first, `limit` per page starting at `offset`.
    async fn orders_for_diner(&self, diner: UserId, offset: usize, limit: usize) -> Result<Vec<Order>, StoreError>;

    async fn add_order(&self, diner: UserId, order: NewOrder) -> Result<Order, StoreError>;
}
