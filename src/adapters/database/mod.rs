//! Storage abstraction layer
//!
//! Trait-based access to run history, staging rows and the canonical catalog,
//! so the engine can run against PostgreSQL or the in-memory store.

pub mod factory;
pub mod traits;

pub use factory::{create_stores, Stores};
pub use traits::{backup_table_name, CatalogStore, StagingStore, SyncRunStore, SyncStore};
