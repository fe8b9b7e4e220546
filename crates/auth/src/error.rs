use thiserror::Error;

use slicehouse_core::DomainError;

use crate::authorize::DenyReason;
use crate::store::StoreError;

/// Error taxonomy of the authentication/authorization core.
///
/// Every variant is scoped to the request that triggered it; none is fatal
/// to the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// E-mail already registered.
    #[error("user already exists")]
    DuplicateIdentity,

    /// Unknown e-mail or wrong password. The two are deliberately
    /// indistinguishable.
    #[error("unknown user")]
    UnknownCredentials,

    /// No credential, or the credential is invalid, expired or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but not permitted.
    #[error("unauthorized")]
    Forbidden(DenyReason),

    /// Target record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Credential store or downstream I/O failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unexpected local failure (hashing, token encoding).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for failures caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::StoreUnavailable(_) | AuthError::Internal(_))
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        AuthError::Validation(value.detail().to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(_) => AuthError::DuplicateIdentity,
            StoreError::NotFound(what) => AuthError::NotFound(what),
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

impl From<DenyReason> for AuthError {
    fn from(value: DenyReason) -> Self {
        match value {
            DenyReason::NotAuthenticated => AuthError::Unauthorized,
            DenyReason::InsufficientRole => AuthError::Forbidden(value),
        }
    }
}
