//! Idempotent staging reconciliation
//!
//! Every decoded record is written with insert-or-replace semantics keyed by
//! its external id, so re-ingesting the same result file yields the same
//! staging state.

use crate::adapters::database::StagingStore;
use crate::core::ingest::record::{ChildRecord, StreamRecord};
use crate::domain::{Result, StagingInventoryLevel, StagingVariant, UpsertOutcome};
use std::sync::Arc;

/// Quantity name summed into `incoming`
pub const INCOMING_QUANTITY: &str = "incoming";

/// Quantity name summed into `committed`
pub const COMMITTED_QUANTITY: &str = "committed";

/// Writes decoded records into staging
#[derive(Clone)]
pub struct Reconciler {
    staging: Arc<dyn StagingStore + Send + Sync>,
}

impl Reconciler {
    pub fn new(staging: Arc<dyn StagingStore + Send + Sync>) -> Self {
        Self { staging }
    }

    /// Insert or fully replace a primary record
    pub async fn upsert_primary(&self, variant: &StagingVariant) -> Result<UpsertOutcome> {
        self.staging.upsert_variant(variant).await
    }

    /// Reduce a child's named quantities and insert or replace it
    pub async fn upsert_child(&self, child: &ChildRecord) -> Result<UpsertOutcome> {
        let level = reduce_quantities(child);
        self.staging.upsert_inventory_level(&level).await
    }

    /// Dispatch a decoded record; unrecognized records are a no-op
    pub async fn apply(&self, record: &StreamRecord) -> Result<Option<UpsertOutcome>> {
        match record {
            StreamRecord::Primary(variant) => self.upsert_primary(variant).await.map(Some),
            StreamRecord::Child(child) => self.upsert_child(child).await.map(Some),
            StreamRecord::Unrecognized => Ok(None),
        }
    }
}

/// Collapse named quantities into fixed fields
///
/// Repeated names are summed; unknown names are dropped.
pub fn reduce_quantities(child: &ChildRecord) -> StagingInventoryLevel {
    let sum = |name: &str| -> i64 {
        child
            .quantities
            .iter()
            .filter(|q| q.name == name)
            .map(|q| q.value)
            .sum()
    };

    StagingInventoryLevel {
        external_id: child.external_id.clone(),
        parent_external_id: child.parent_external_id.clone(),
        incoming: sum(INCOMING_QUANTITY),
        committed: sum(COMMITTED_QUANTITY),
    }
}
