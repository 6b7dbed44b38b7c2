//! Canonical catalog rebuild
//!
//! Rebuilds the catalog table from staging on every run:
//!
//! 1. Optionally snapshot the current catalog
//! 2. Capture sticky values keyed by natural key
//! 3. Fan each eligible staging row out over its classification tokens
//! 4. Derive pending supply from linked inventory levels
//! 5. Reapply sticky values and drop duplicate `(natural_key, category)` pairs
//! 6. Replace the catalog contents in one atomic step

pub mod rules;

use crate::adapters::database::{CatalogStore, StagingStore};
use crate::config::TransformConfig;
use crate::domain::{CatalogItem, Result, StagingVariant};
use chrono::Utc;
use rules::{
    check_eligibility, pending_supply_by_parent, pricing_fields, split_classification,
    CategoryIndex,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Per-invocation options
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// Skip the snapshot even when configured
    pub skip_backup: bool,
}

/// Outcome of one rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    /// Catalog rows written
    pub processed: u64,
    /// Classification tokens with no matching category
    pub skipped: u64,
    /// Staging rows failing the eligibility predicate
    pub ineligible: u64,
    /// Duplicate `(natural_key, category)` rows dropped
    pub duplicates: u64,
    /// Name of the snapshot taken before the rebuild
    pub backup_ref: Option<String>,
}

/// Rebuilds the canonical catalog from staging
#[derive(Clone)]
pub struct TransformStage {
    staging: Arc<dyn StagingStore + Send + Sync>,
    catalog: Arc<dyn CatalogStore + Send + Sync>,
    config: TransformConfig,
}

impl TransformStage {
    pub fn new(
        staging: Arc<dyn StagingStore + Send + Sync>,
        catalog: Arc<dyn CatalogStore + Send + Sync>,
        config: TransformConfig,
    ) -> Self {
        Self {
            staging,
            catalog,
            config,
        }
    }

    /// Run the rebuild
    ///
    /// Staging rows are read in `external_id` string order, so when rows share
    /// `(natural_key, category_id)` the one with the lowest external id is kept
    /// (`…/10` sorts before `…/9`), not the one ingested first.
    ///
    /// # Errors
    ///
    /// Any store error aborts the rebuild. The catalog replacement is atomic,
    /// so a failure leaves the previous contents in place.
    pub async fn run(&self, options: TransformOptions) -> Result<TransformSummary> {
        let mut summary = TransformSummary::default();

        if self.config.backup_before_rebuild && !options.skip_backup {
            let name = self.catalog.backup_catalog(Utc::now()).await?;
            tracing::info!(backup = %name, "Catalog snapshot taken");
            summary.backup_ref = Some(name);
        }

        let sticky = self.catalog.capture_sticky().await?;
        let categories = CategoryIndex::new(self.catalog.list_categories().await?);
        let variants = self.staging.load_variants().await?;
        let pending = pending_supply_by_parent(&self.staging.load_inventory_levels().await?);

        tracing::debug!(
            variants = variants.len(),
            categories = categories.len(),
            sticky = sticky.len(),
            "Transform inputs loaded"
        );

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for variant in &variants {
            if let Err(reason) = check_eligibility(variant, &self.config) {
                tracing::trace!(
                    external_id = %variant.external_id,
                    reason = ?reason,
                    "Staging row not eligible"
                );
                summary.ineligible += 1;
                continue;
            }

            for mut item in self.fan_out(variant, &categories, &mut summary) {
                item.pending_supply = pending
                    .get(variant.external_id.as_str())
                    .copied()
                    .unwrap_or(0);
                if !seen.insert((item.natural_key.clone(), item.category_id)) {
                    summary.duplicates += 1;
                    continue;
                }
                if let Some(values) = sticky.get(&item.natural_key) {
                    item.apply_sticky(values);
                }
                items.push(item);
            }
        }

        summary.processed = self.catalog.replace_catalog(&items).await?;

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            ineligible = summary.ineligible,
            duplicates = summary.duplicates,
            backup = ?summary.backup_ref,
            "Catalog rebuilt"
        );
        Ok(summary)
    }

    /// One candidate row per classification token with a matching category
    fn fan_out(
        &self,
        variant: &StagingVariant,
        categories: &CategoryIndex,
        summary: &mut TransformSummary,
    ) -> Vec<CatalogItem> {
        let (Some(natural_key), Some(classification)) = (
            variant.natural_key.as_deref(),
            variant.attribute(&self.config.classification_field),
        ) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for token in split_classification(classification, &self.config.mode_marker) {
            let Some(category) = categories.find(&token) else {
                tracing::debug!(
                    natural_key,
                    token = %token.name,
                    preorder = token.preorder,
                    "No category for classification token"
                );
                summary.skipped += 1;
                continue;
            };

            items.push(CatalogItem {
                natural_key: natural_key.trim().to_string(),
                external_id: variant.external_id.clone(),
                title: variant.title.clone(),
                category_id: category.id,
                preorder: token.preorder,
                price: variant.price.clone(),
                compare_at_price: variant.compare_at_price.clone(),
                pricing: pricing_fields(variant, &self.config),
                pending_supply: 0,
                display_order: None,
            });
        }
        items
    }
}
