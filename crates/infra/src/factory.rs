//! HTTP client for the pizza factory.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use slicehouse_auth::User;
use slicehouse_core::UserId;
use slicehouse_orders::{Fulfillment, FulfillmentError, FulfillmentReceipt, Order};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct FactoryDiner<'a> {
    id: UserId,
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct FactoryRequest<'a> {
    diner: FactoryDiner<'a>,
    order: &'a Order,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FactoryResponse {
    jwt: Option<String>,
    report_url: Option<String>,
    message: Option<String>,
}

/// Posts orders to `{base_url}/api/order` authenticated with the factory API key.
#[derive(Clone)]
pub struct HttpFactoryClient {
    client: reqwest::Client,
    order_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpFactoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFactoryClient")
            .field("order_url", &self.order_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl HttpFactoryClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            order_url: format!("{}/api/order", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub fn order_url(&self) -> &str {
        &self.order_url
    }
}

#[async_trait]
impl Fulfillment for HttpFactoryClient {
    async fn fulfill(&self, diner: &User, order: &Order) -> Result<FulfillmentReceipt, FulfillmentError> {
        let body = FactoryRequest {
            diner: FactoryDiner {
                id: diner.id,
                name: &diner.name,
                email: &diner.email,
            },
            order,
        };

        let started = std::time::Instant::now();
        let resp = self
            .client
            .post(&self.order_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order.id, error = %e, "factory unreachable");
                FulfillmentError {
                    message: e.to_string(),
                    report_url: None,
                }
            })?;

        let status = resp.status();
        let parsed: FactoryResponse = resp.json().await.unwrap_or_default();
        tracing::info!(
            order_id = %order.id,
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            jwt = if parsed.jwt.is_some() { "*****" } else { "-" },
            "factory call completed"
        );

        match parsed.jwt {
            Some(jwt) if status.is_success() => Ok(FulfillmentReceipt {
                jwt,
                report_url: parsed.report_url,
            }),
            _ => Err(FulfillmentError {
                message: parsed
                    .message
                    .unwrap_or_else(|| format!("factory responded with {status}")),
                report_url: parsed.report_url,
            }),
        }
    }
}
