//! Infrastructure layer: stores and external service clients.

pub mod factory;
pub mod store;


pub use factory::HttpFactoryClient;
pub use store::{InMemoryStore, PostgresStore};
