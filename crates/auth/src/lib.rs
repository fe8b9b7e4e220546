//! `slicehouse-auth`: authentication and authorization core.
//!
//! Credential lifecycle (issue, verify, revoke) and the authorization decision
//! every protected operation calls before acting. This crate is decoupled
//! from HTTP; storage is reached only through [`CredentialStore`].

pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod roles;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

pub use authorize::{Action, Authorizer, Decision, DenyReason, Resource, authorize, decide};
pub use claims::{TokenClaims, TokenId, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use password::{Argon2Passwords, PasswordScheme};
pub use roles::{Role, RoleAssignment};
pub use session::{AuthSession, SessionManager};
pub use store::{CredentialStore, StoreError};
pub use token::{Hs256TokenCodec, IssuedToken, TokenCodec, TokenError};
pub use user::{NewUser, User, UserPatch};
