use std::sync::Arc;

use slicehouse_auth::{Action, Authorizer, Resource, User};
use slicehouse_franchises::FranchiseRepository;

use crate::{
    Fulfillment, MenuItem, NewMenuItem, NewOrder, OrderError, OrderPage, OrderRepository, PlacedOrder,
};

/// Orders per page in a diner's history.
pub const ORDERS_PAGE_SIZE: usize = 10;

/// Menu and order management.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    franchises: Arc<dyn FranchiseRepository>,
    fulfillment: Arc<dyn Fulfillment>,
    authorizer: Authorizer,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        franchises: Arc<dyn FranchiseRepository>,
        fulfillment: Arc<dyn Fulfillment>,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            orders,
            franchises,
            fulfillment,
            authorizer,
        }
    }

    /// The menu is readable without authentication.
    pub async fn menu(&self) -> Result<Vec<MenuItem>, OrderError> {
        Ok(self.orders.menu().await?)
    }

    /// Add a menu item (system admins only). Returns the updated menu.
    pub async fn add_menu_item(&self, actor: &User, item: NewMenuItem) -> Result<Vec<MenuItem>, OrderError> {
        self.authorizer
            .require(Some(actor), Action::Create, Resource::Menu)
            .await?;

        item.validate()?;
        let added = self.orders.add_menu_item(item).await?;
        tracing::info!(menu_item_id = %added.id, "menu item added");
        self.menu().await
    }

    /// The actor's own orders, `page` starting at 1.
    pub async fn orders(&self, actor: &User, page: u32) -> Result<OrderPage, OrderError> {
        self.authorizer
            .require(Some(actor), Action::Read, Resource::Orders(actor.id))
            .await?;

        let page = page.max(1);
        let offset = (page as usize - 1) * ORDERS_PAGE_SIZE;
        let orders = self
            .orders
            .orders_for_diner(actor.id, offset, ORDERS_PAGE_SIZE)
            .await?;

        Ok(OrderPage {
            diner_id: actor.id,
            orders,
            page,
        })
    }

    /// Persist an order for the actor and hand it to the factory.
    ///
    /// The order stays recorded when fulfillment fails; the failure carries
    /// the factory's report link when one was returned.
    pub async fn create_order(&self, actor: &User, request: NewOrder) -> Result<PlacedOrder, OrderError> {
        self.authorizer
            .require(Some(actor), Action::Create, Resource::Orders(actor.id))
            .await?;

        request.validate()?;

        let franchise = self
            .franchises
            .find_franchise(request.franchise_id)
            .await?
            .ok_or(OrderError::NotFound("franchise"))?;
        if !franchise.stores.iter().any(|s| s.id == request.store_id) {
            return Err(OrderError::NotFound("store"));
        }
        for item in &request.items {
            if self.orders.find_menu_item(item.menu_id).await?.is_none() {
                return Err(OrderError::Validation(format!("unknown menu item {}", item.menu_id)));
            }
        }

        let order = self.orders.add_order(actor.id, request).await?;
        tracing::info!(order_id = %order.id, diner_id = %actor.id, items = order.items.len(), "order placed");

        match self.fulfillment.fulfill(actor, &order).await {
            Ok(receipt) => Ok(PlacedOrder {
                order,
                jwt: receipt.jwt,
                report_url: receipt.report_url,
            }),
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "order fulfillment failed");
                Err(OrderError::Fulfillment {
                    message: e.message,
                    report_url: e.report_url,
                })
            }
        }
    }
}
