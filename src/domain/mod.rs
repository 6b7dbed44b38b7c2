//! Domain models and types for the sync engine.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ExternalId`], [`OperationId`], [`RunId`])
//! - **Run history** ([`SyncRun`] and its status state machine)
//! - **Remote job snapshots** ([`RemoteJobHandle`])
//! - **Staging and canonical records** ([`StagingVariant`], [`CatalogItem`], ...)
//! - **Query configuration** ([`FieldMapping`])
//! - **Error types** ([`SyncError`], [`RemoteError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SyncError>`]:
//!
//! ```rust
//! use catalog_sync::domain::{Result, SyncError};
//!
//! fn example() -> Result<()> {
//!     Err(SyncError::Validation("metafield count mismatch".to_string()))
//! }
//! ```

pub mod bulk_operation;
pub mod errors;
pub mod field_mapping;
pub mod ids;
pub mod records;
pub mod result;
pub mod sync_run;

// Re-export commonly used types for convenience
pub use bulk_operation::{RemoteJobHandle, RemoteJobStatus};
pub use errors::{RemoteError, SyncError};
pub use field_mapping::{FieldMapping, FieldType};
pub use ids::{ExternalId, OperationId, RunId};
pub use records::{
    CatalogItem, Category, StagingInventoryLevel, StagingVariant, StickyFields, UpsertOutcome,
};
pub use result::Result;
pub use sync_run::{RunStatus, SyncRun, SyncType};
