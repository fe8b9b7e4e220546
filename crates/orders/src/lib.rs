//! `slicehouse-orders`: menu and diner orders.

pub mod error;
pub mod fulfillment;
pub mod menu;
pub mod order;
pub mod repository;
pub mod service;

pub use error::OrderError;
pub use fulfillment::{Fulfillment, FulfillmentError, FulfillmentReceipt, LocalFulfillment};
pub use menu::{MenuItem, NewMenuItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderPage, PlacedOrder};
pub use repository::OrderRepository;
pub use service::{ORDERS_PAGE_SIZE, OrderService};
