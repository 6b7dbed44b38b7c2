//! Store factory
//!
//! Builds the three storage trait objects the engine needs from configuration.

use crate::adapters::database::traits::{CatalogStore, StagingStore, SyncRunStore, SyncStore};
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::SyncConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Storage handles shared by the orchestrator, transform stage and health monitor
#[derive(Clone)]
pub struct Stores {
    pub runs: Arc<dyn SyncRunStore + Send + Sync>,
    pub staging: Arc<dyn StagingStore + Send + Sync>,
    pub catalog: Arc<dyn CatalogStore + Send + Sync>,
}

impl Stores {
    /// Use one backend for all three stores
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: SyncStore + 'static,
    {
        Self {
            runs: store.clone(),
            staging: store.clone(),
            catalog: store,
        }
    }
}

/// Create the PostgreSQL-backed stores, sharing one connection pool
///
/// The schema is applied before the stores are returned.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or the schema cannot be applied.
pub async fn create_stores(config: &SyncConfig) -> Result<Stores> {
    tracing::info!("Creating PostgreSQL stores");
    let client = Arc::new(PostgreSQLClient::new(config.postgresql.clone()).await?);
    client.ensure_schema().await?;

    let adapter = Arc::new(PostgreSQLAdapter::new_with_arc(client));
    Ok(Stores::from_shared(adapter))
}
