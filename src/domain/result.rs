//! Result type alias for the sync engine

use super::errors::SyncError;

/// Result type alias for sync operations
///
/// # Examples
///
/// ```
/// use catalog_sync::domain::result::Result;
/// use catalog_sync::domain::errors::SyncError;
///
/// fn failing_function() -> Result<()> {
///     Err(SyncError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SyncError>;
