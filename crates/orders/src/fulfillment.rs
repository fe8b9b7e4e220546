//! Order fulfillment contract (the pizza factory).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use slicehouse_auth::User;

use crate::Order;

/// Proof of fulfillment returned by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentReceipt {
    pub jwt: String,
    #[serde(default)]
    pub report_url: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("fulfillment failed: {message}")]
pub struct FulfillmentError {
    pub message: String,
    pub report_url: Option<String>,
}

#[async_trait]
pub trait Fulfillment: Send + Sync {
    async fn fulfill(&self, diner: &User, order: &Order) -> Result<FulfillmentReceipt, FulfillmentError>;
}

/// Accepts every order without contacting a factory (dev/test wiring).
#[derive(Debug, Clone, Default)]
pub struct LocalFulfillment;

#[async_trait]
impl Fulfillment for LocalFulfillment {
    async fn fulfill(&self, diner: &User, order: &Order) -> Result<FulfillmentReceipt, FulfillmentError> {
        tracing::debug!(order_id = %order.id, diner_id = %diner.id, "order fulfilled locally");
        Ok(FulfillmentReceipt {
            jwt: format!("local.{}.{}", diner.id, order.id),
            report_url: None,
        })
    }
}
