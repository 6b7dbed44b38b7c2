//! Remote bulk operation API abstraction
//!
//! The orchestrator and guard talk to the remote platform only through this
//! trait, so tests can script job lifecycles without HTTP.

use crate::domain::{OperationId, RemoteJobHandle, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Chunked result body; chunk boundaries are arbitrary
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Bulk export job operations on the remote platform
#[async_trait]
pub trait BulkOperationApi: Send + Sync {
    /// Submit a bulk query
    ///
    /// Mutation `userErrors` surface as [`RemoteError::UserErrors`](crate::domain::RemoteError::UserErrors).
    async fn start_bulk_query(&self, query: &str) -> Result<RemoteJobHandle>;

    /// Current status of a specific job
    async fn poll_status(&self, operation_id: &OperationId) -> Result<RemoteJobHandle>;

    /// The shop's current (most recent) bulk query job, if any
    async fn current_operation(&self) -> Result<Option<RemoteJobHandle>>;

    /// Stream the NDJSON result file of a completed job
    async fn download_results(&self, url: &str) -> Result<ByteStream>;
}
