//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! rolling JSON file, plus a few macros that keep field names consistent
//! across the sync lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use catalog_sync::logging::init_logging;
//! use catalog_sync::config::LoggingConfig;
//!
//! let _guard = init_logging("info", &LoggingConfig::default()).expect("Failed to initialize logging");
//! tracing::info!(operation_id = "gid://shopify/BulkOperation/1", "Bulk operation started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a run status change
///
/// # Example
///
/// ```
/// use catalog_sync::log_run_transition;
/// use catalog_sync::domain::{SyncRun, SyncType};
///
/// let run = SyncRun::new(SyncType::Scheduled);
/// log_run_transition!(&run);
/// ```
#[macro_export]
macro_rules! log_run_transition {
    ($run:expr) => {
        tracing::info!(
            run_id = %$run.id,
            sync_type = %$run.sync_type,
            status = %$run.status,
            operation_id = ?$run.operation_id.as_ref().map(|id| id.as_str()),
            item_count = ?$run.item_count,
            error = ?$run.error_message,
            "Sync run transition"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```
/// use catalog_sync::log_retry_attempt;
///
/// log_retry_attempt!(2, 4, 1500u64, "HTTP 503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying remote call"
        );
    };
}

/// Log an ingestion checkpoint
///
/// # Example
///
/// ```
/// use catalog_sync::log_ingest_checkpoint;
///
/// log_ingest_checkpoint!(5000u64, 2u64);
/// ```
#[macro_export]
macro_rules! log_ingest_checkpoint {
    ($processed:expr, $errors:expr) => {
        tracing::info!(
            processed = $processed,
            errors = $errors,
            "Ingestion checkpoint"
        );
    };
}
