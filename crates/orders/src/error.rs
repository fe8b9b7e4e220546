use thiserror::Error;

use slicehouse_auth::{AuthError, StoreError};
use slicehouse_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The order was stored but the factory did not accept it. `message`
    /// is the factory's own explanation and stays server-side.
    #[error("Failed to fulfill order at factory")]
    Fulfillment { message: String, report_url: Option<String> },

    #[error("store unavailable: {0}")]
    Store(String),
}

impl From<DomainError> for OrderError {
    fn from(value: DomainError) -> Self {
        OrderError::Validation(value.detail().to_string())
    }
}

impl From<StoreError> for OrderError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => OrderError::NotFound(what),
            StoreError::Conflict(msg) => OrderError::Validation(msg),
            StoreError::Unavailable(msg) => OrderError::Store(msg),
        }
    }
}
