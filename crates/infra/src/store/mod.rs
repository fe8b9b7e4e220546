//! Backends implementing the credential, franchise and order contracts.
//!
//! Each backend is a single type implementing all three traits, so the
//! authorization engine sees the same role assignments the franchise
//! service writes.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
