use async_trait::async_trait;

use slicehouse_auth::StoreError;
use slicehouse_core::{FranchiseId, StoreId, UserId};

use crate::{Franchise, Store};

/// Persistence contract for franchises and stores.
#[async_trait]
pub trait FranchiseRepository: Send + Sync {
    async fn list_franchises(&self) -> Result<Vec<Franchise>, StoreError>;

    async fn find_franchise(&self, id: FranchiseId) -> Result<Option<Franchise>, StoreError>;

    /// Franchises where `user` holds a franchise-admin assignment.
    async fn franchises_administered_by(&self, user: UserId) -> Result<Vec<Franchise>, StoreError>;

    /// Create a franchise and grant each listed user `FranchiseAdmin` on it.
    async fn create_franchise(&self, name: &str, admins: &[UserId]) -> Result<Franchise, StoreError>;

    /// Delete a franchise, its stores and every assignment scoped to it.
    /// Users left without any assignment fall back to `Diner`. Deleting an
    /// absent franchise is a no-op.
    async fn delete_franchise(&self, id: FranchiseId) -> Result<(), StoreError>;

    async fn create_store(&self, franchise: FranchiseId, name: &str) -> Result<Store, StoreError>;

    /// No-op when the store is absent or belongs to another franchise.
    async fn delete_store(&self, franchise: FranchiseId, store: StoreId) -> Result<(), StoreError>;
}
