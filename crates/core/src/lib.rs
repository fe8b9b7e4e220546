//! `slicehouse-core`: shared identifiers and the domain error model.
//!
//! This crate has no infrastructure concerns and no knowledge of HTTP.

pub mod error;
pub mod id;
pub mod validate;

pub use error::{DomainError, DomainResult};
pub use id::{FranchiseId, MenuItemId, OrderId, StoreId, UserId};
