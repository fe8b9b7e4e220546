use thiserror::Error;

use slicehouse_auth::{AuthError, StoreError};
use slicehouse_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FranchiseError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    /// An admin e-mail named at creation does not belong to any user.
    #[error("unknown user for franchise admin {0}")]
    UnknownAdmin(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("store unavailable: {0}")]
    Store(String),
}

impl From<DomainError> for FranchiseError {
    fn from(value: DomainError) -> Self {
        FranchiseError::Validation(value.detail().to_string())
    }
}

impl From<StoreError> for FranchiseError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => FranchiseError::NotFound(what),
            StoreError::Conflict(msg) => FranchiseError::Validation(msg),
            StoreError::Unavailable(msg) => FranchiseError::Store(msg),
        }
    }
}
