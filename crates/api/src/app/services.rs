//! Service wiring: one store backs sessions, franchises and orders.

use std::sync::Arc;

use thiserror::Error;

use slicehouse_auth::{
    Argon2Passwords, AuthError, CredentialStore, Hs256TokenCodec, PasswordScheme, SessionManager, StoreError,
    TokenCodec,
};
use slicehouse_franchises::{FranchiseRepository, FranchiseService};
use slicehouse_infra::{HttpFactoryClient, InMemoryStore, PostgresStore};
use slicehouse_observability::Metrics;
use slicehouse_orders::{Fulfillment, LocalFulfillment, OrderRepository, OrderService};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("admin seeding: {0}")]
    Auth(#[from] AuthError),

    #[error("factory client: {0}")]
    Factory(String),

    #[error("token ttl out of range")]
    TokenTtl,
}

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub sessions: SessionManager,
    pub franchises: FranchiseService,
    pub orders: OrderService,
    pub credentials: Arc<dyn CredentialStore>,
    pub metrics: Arc<Metrics>,
}

impl AppServices {
    /// Wire the services over a single backing store.
    pub fn assemble<S>(
        store: Arc<S>,
        codec: Arc<dyn TokenCodec>,
        passwords: Arc<dyn PasswordScheme>,
        fulfillment: Arc<dyn Fulfillment>,
    ) -> Self
    where
        S: CredentialStore + FranchiseRepository + OrderRepository + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let sessions = SessionManager::new(credentials.clone(), codec, passwords);
        let authorizer = sessions.authorizer().clone();

        let franchises = FranchiseService::new(store.clone(), credentials.clone(), authorizer.clone());
        let orders = OrderService::new(store.clone(), store, fulfillment, authorizer);

        Self {
            sessions,
            franchises,
            orders,
            credentials,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// In-memory store with local fulfillment (tests and local runs).
    pub fn in_memory(jwt_secret: &str, passwords: Arc<dyn PasswordScheme>) -> Self {
        let codec = Arc::new(Hs256TokenCodec::new(jwt_secret, chrono::Duration::days(1)));
        Self::assemble(
            Arc::new(InMemoryStore::new()),
            codec,
            passwords,
            Arc::new(LocalFulfillment),
        )
    }

    /// Production wiring: Postgres when `DATABASE_URL` is set, the HTTP
    /// factory when `FACTORY_URL` is set, and an optional seeded admin.
    pub async fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        let ttl = chrono::Duration::from_std(config.token_ttl).map_err(|_| BootstrapError::TokenTtl)?;
        let codec: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(&config.jwt_secret, ttl));
        let passwords: Arc<dyn PasswordScheme> = Arc::new(Argon2Passwords::new());

        let fulfillment: Arc<dyn Fulfillment> = match &config.factory {
            Some(factory) => {
                let client = HttpFactoryClient::new(&factory.url, factory.api_key.clone())
                    .map_err(|e| BootstrapError::Factory(e.to_string()))?;
                tracing::info!(url = client.order_url(), "using pizza factory");
                Arc::new(client)
            }
            None => {
                tracing::warn!("FACTORY_URL not set; orders are fulfilled locally");
                Arc::new(LocalFulfillment)
            }
        };

        let services = match &config.database_url {
            Some(url) => {
                let store = PostgresStore::connect(url).await?;
                store.migrate().await?;
                tracing::info!("using postgres store");
                Self::assemble(Arc::new(store), codec, passwords, fulfillment)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Self::assemble(Arc::new(InMemoryStore::new()), codec, passwords, fulfillment)
            }
        };

        if let Some(admin) = &config.admin {
            services
                .sessions
                .ensure_admin(&admin.name, &admin.email, &admin.password)
                .await?;
        }

        Ok(services)
    }
}
