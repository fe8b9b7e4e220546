//! `slicehouse-franchises`: franchises and their stores.
//!
//! Every mutation goes through the authorization engine before it reaches
//! the repository.

pub mod error;
pub mod franchise;
pub mod repository;
pub mod service;

pub use error::FranchiseError;
pub use franchise::{AdminRef, Franchise, FranchiseAdmin, NewFranchise, NewStore, Store};
pub use repository::FranchiseRepository;
pub use service::FranchiseService;
