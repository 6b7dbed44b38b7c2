//! Sync run orchestration
//!
//! [`SyncOrchestrator`] owns the run lifecycle:
//!
//! ```text
//! sweep orphans -> guard -> resolve query -> start job -> poll -> ingest -> transform -> finalize
//! ```
//!
//! A run that reaches `completed`, `failed`, `timeout` or `cancelled` never
//! changes status again.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::SyncOrchestrator;
pub use outcome::{CompletionPayload, SyncOptions, SyncOutcome, SyncResponse};
