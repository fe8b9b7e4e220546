use std::sync::Arc;

use slicehouse_auth::{Action, Authorizer, CredentialStore, Resource, User};
use slicehouse_core::{FranchiseId, StoreId, UserId};

use crate::{Franchise, FranchiseError, FranchiseRepository, NewFranchise, NewStore, Store};

/// Franchise and store management.
#[derive(Clone)]
pub struct FranchiseService {
    repo: Arc<dyn FranchiseRepository>,
    users: Arc<dyn CredentialStore>,
    authorizer: Authorizer,
}

impl FranchiseService {
    pub fn new(repo: Arc<dyn FranchiseRepository>, users: Arc<dyn CredentialStore>, authorizer: Authorizer) -> Self {
        Self { repo, users, authorizer }
    }

    /// List every franchise. Readable without authentication; admin
    /// identities are included only for system admins.
    pub async fn list(&self, viewer: Option<&User>) -> Result<Vec<Franchise>, FranchiseError> {
        let franchises = self.repo.list_franchises().await?;
        if viewer.is_some_and(User::is_system_admin) {
            return Ok(franchises);
        }
        Ok(franchises.into_iter().map(Franchise::without_admins).collect())
    }

    /// Franchises administered by `user`.
    ///
    /// Callers other than the user themself or a system admin get an empty
    /// list rather than an error.
    pub async fn user_franchises(&self, actor: &User, user: UserId) -> Result<Vec<Franchise>, FranchiseError> {
        let decision = self
            .authorizer
            .authorize(Some(actor), Action::Read, Resource::User(user))
            .await?;
        if !decision.is_allowed() {
            return Ok(Vec::new());
        }
        Ok(self.repo.franchises_administered_by(user).await?)
    }

    /// Create a franchise; every admin e-mail must belong to a registered user.
    pub async fn create(&self, actor: &User, request: NewFranchise) -> Result<Franchise, FranchiseError> {
        self.authorizer
            .require(Some(actor), Action::Create, Resource::FranchiseCatalog)
            .await?;

        let name = request.validate()?;

        let mut admin_ids = Vec::with_capacity(request.admins.len());
        for admin in &request.admins {
            let email = admin.email.trim().to_lowercase();
            match self.users.find_user_by_email(&email).await? {
                Some(user) => admin_ids.push(user.id),
                None => return Err(FranchiseError::UnknownAdmin(admin.email.clone())),
            }
        }

        let franchise = self.repo.create_franchise(name, &admin_ids).await?;
        tracing::info!(franchise_id = %franchise.id, admins = admin_ids.len(), "franchise created");
        Ok(franchise)
    }

    pub async fn delete(&self, actor: &User, franchise: FranchiseId) -> Result<(), FranchiseError> {
        self.authorizer
            .require(Some(actor), Action::Delete, Resource::Franchise(franchise))
            .await?;

        self.repo.delete_franchise(franchise).await?;
        tracing::info!(franchise_id = %franchise, "franchise deleted");
        Ok(())
    }

    /// Create a store (system admin or admin of `franchise`).
    pub async fn create_store(
        &self,
        actor: &User,
        franchise: FranchiseId,
        request: NewStore,
    ) -> Result<Store, FranchiseError> {
        self.authorizer
            .require(Some(actor), Action::Create, Resource::Store { franchise, store: None })
            .await?;

        let name = request.validate()?;
        if self.repo.find_franchise(franchise).await?.is_none() {
            return Err(FranchiseError::NotFound("franchise"));
        }

        let store = self.repo.create_store(franchise, name).await?;
        tracing::info!(franchise_id = %franchise, store_id = %store.id, "store created");
        Ok(store)
    }

    /// Delete a store. Authorization is evaluated against the store's real
    /// owning franchise, not the one named by the caller.
    pub async fn delete_store(&self, actor: &User, franchise: FranchiseId, store: StoreId) -> Result<(), FranchiseError> {
        self.authorizer
            .require(Some(actor), Action::Delete, Resource::Store { franchise, store: Some(store) })
            .await?;

        self.repo.delete_store(franchise, store).await?;
        tracing::info!(franchise_id = %franchise, store_id = %store, "store deleted");
        Ok(())
    }
}
