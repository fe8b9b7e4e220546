use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use slicehouse_api::app::{AppServices, build_app};
use slicehouse_auth::{
    Argon2Passwords, CredentialStore, Hs256TokenCodec, NewUser, SessionManager, StoreError, TokenId, User, UserPatch,
};
use slicehouse_core::{FranchiseId, StoreId, UserId};
use slicehouse_franchises::FranchiseService;
use slicehouse_infra::InMemoryStore;
use slicehouse_observability::Metrics;
use slicehouse_orders::{LocalFulfillment, OrderService};

/// In-memory credentials whose token registry can be switched off.
struct SwitchableCredentials {
    inner: Arc<InMemoryStore>,
    registry_down: AtomicBool,
}

impl SwitchableCredentials {
    fn check(&self) -> Result<(), StoreError> {
        if self.registry_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SwitchableCredentials {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.insert_user(user).await
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, StoreError> {
        self.inner.update_user(id, patch).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.inner.delete_user(id).await
    }

    async fn register_token_active(
        &self,
        id: TokenId,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.register_token_active(id, user, expires_at).await
    }

    async fn revoke_token(&self, id: TokenId) -> Result<(), StoreError> {
        self.inner.revoke_token(id).await
    }

    async fn is_token_active(&self, id: TokenId) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.is_token_active(id).await
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.purge_expired_tokens(now).await
    }

    async fn find_franchise_admins(&self, franchise: FranchiseId) -> Result<HashSet<UserId>, StoreError> {
        self.inner.find_franchise_admins(franchise).await
    }

    async fn find_store_franchise(&self, store: StoreId) -> Result<Option<FranchiseId>, StoreError> {
        self.inner.find_store_franchise(store).await
    }
}

#[tokio::test]
async fn registry_outage_is_a_server_error_not_a_dead_session() {
    let store = Arc::new(InMemoryStore::new());
    let credentials = Arc::new(SwitchableCredentials {
        inner: store.clone(),
        registry_down: AtomicBool::new(false),
    });

    let codec = Arc::new(Hs256TokenCodec::new("test-secret", Duration::days(1)));
    let passwords = Arc::new(Argon2Passwords::with_params(8, 1, 1).unwrap());
    let sessions = SessionManager::new(credentials.clone(), codec, passwords);
    let authorizer = sessions.authorizer().clone();

    let services = AppServices {
        franchises: FranchiseService::new(store.clone(), credentials.clone(), authorizer.clone()),
        orders: OrderService::new(store.clone(), store, Arc::new(LocalFulfillment), authorizer),
        sessions,
        credentials: credentials.clone(),
        metrics: Arc::new(Metrics::new()),
    };

    let app = build_app(Arc::new(services));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{base_url}/api/auth"))
        .json(&json!({ "name": "pizza diner", "email": "d@jwt.com", "password": "diner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    credentials.registry_down.store(true, Ordering::SeqCst);

    let res = client
        .get(format!("{base_url}/api/order"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_unavailable");

    // Anonymous requests do not touch the registry.
    let res = client.get(format!("{base_url}/api/order/menu")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    credentials.registry_down.store(false, Ordering::SeqCst);
    let res = client
        .get(format!("{base_url}/api/order"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.abort();
}
