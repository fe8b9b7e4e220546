//! Credential store contract.
//!
//! The core never touches a database directly. It reads and writes users and
//! the active-token registry through this trait, which infra implements for
//! in-memory (dev/test) and Postgres backends.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use slicehouse_core::{FranchiseId, StoreId, UserId};

use crate::claims::TokenId;
use crate::user::{NewUser, User, UserPatch};

/// Store operation error.
///
/// Each single-record operation is atomic; no operation here spans records
/// transactionally beyond what the backend guarantees natively.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique constraint hit (e.g. e-mail already taken).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record to update or delete does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Backend failure (connection, query, pool closed).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Insert a user and assign its id. Fails with `Conflict` on a taken e-mail.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply the supplied fields. `patch.password` must already be a digest.
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, StoreError>;

    /// Delete a user and cascade its role assignments.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    /// Mark a token as honoured until `expires_at`.
    async fn register_token_active(
        &self,
        id: TokenId,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove a token from the registry. Removing an absent id is not an error.
    async fn revoke_token(&self, id: TokenId) -> Result<(), StoreError>;

    async fn is_token_active(&self, id: TokenId) -> Result<bool, StoreError>;

    /// Drop registry entries whose expiry has passed. Returns how many went.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Users holding `FranchiseAdmin(franchise)`.
    async fn find_franchise_admins(&self, franchise: FranchiseId) -> Result<HashSet<UserId>, StoreError>;

    /// Owning franchise of a store, if the store exists.
    async fn find_store_franchise(&self, store: StoreId) -> Result<Option<FranchiseId>, StoreError>;
}
