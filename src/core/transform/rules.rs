//! Canonical transform rules
//!
//! Pure functions over staging rows: eligibility, classification fan-out,
//! mode marker handling, category matching and pending supply.

use crate::config::TransformConfig;
use crate::domain::{Category, StagingInventoryLevel, StagingVariant};
use std::collections::{BTreeMap, HashMap};

/// Why a staging row was left out of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    MissingKey,
    KeyWithoutDelimiter,
    MissingClassification,
    Excluded,
    MissingPricing,
}

/// A classification token after mode marker handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationToken {
    pub name: String,
    pub preorder: bool,
}

/// Check whether a staging row may produce catalog rows
pub fn check_eligibility(
    variant: &StagingVariant,
    config: &TransformConfig,
) -> Result<(), Ineligibility> {
    let key = variant
        .natural_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(Ineligibility::MissingKey)?;
    if !key.contains(config.key_delimiter.as_str()) {
        return Err(Ineligibility::KeyWithoutDelimiter);
    }

    let classification = variant
        .attribute(&config.classification_field)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(Ineligibility::MissingClassification)?;
    if !config.exclusion_keyword.is_empty()
        && contains_ignore_case(classification, &config.exclusion_keyword)
    {
        return Err(Ineligibility::Excluded);
    }

    let has_pricing = config.required_pricing_fields.iter().all(|field| {
        variant
            .attribute(field)
            .is_some_and(|value| !value.trim().is_empty())
    });
    if !has_pricing {
        return Err(Ineligibility::MissingPricing);
    }

    Ok(())
}

/// Split a comma-separated classification into tokens
///
/// Tokens are trimmed and blanks dropped. A token containing the mode marker
/// (case-insensitive) has it stripped and is flagged as pre-order.
///
/// # Examples
///
/// ```
/// use catalog_sync::core::transform::rules::split_classification;
///
/// let tokens = split_classification("Swim, Resort PreOrder,", "PreOrder");
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[1].name, "Resort");
/// assert!(tokens[1].preorder);
/// ```
pub fn split_classification(value: &str, mode_marker: &str) -> Vec<ClassificationToken> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let token = strip_marker(token, mode_marker);
            (!token.name.is_empty()).then_some(token)
        })
        .collect()
}

fn strip_marker(token: &str, marker: &str) -> ClassificationToken {
    let position = if marker.is_empty() {
        None
    } else {
        token.to_ascii_lowercase().find(&marker.to_ascii_lowercase())
    };

    match position {
        Some(start) => {
            let mut name = String::with_capacity(token.len());
            name.push_str(&token[..start]);
            name.push(' ');
            name.push_str(&token[start + marker.len()..]);
            ClassificationToken {
                name: collapse(&name),
                preorder: true,
            }
        }
        None => ClassificationToken {
            name: token.to_string(),
            preorder: false,
        },
    }
}

/// Join whitespace runs and trim separators left behind by a removed marker
fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == '_' || c == ':' || c.is_whitespace())
        .to_string()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(needle.to_lowercase().as_str())
}

/// Category lookup by case-insensitive name and pre-order flag
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    by_key: HashMap<(String, bool), Category>,
}

impl CategoryIndex {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut by_key = HashMap::new();
        for category in categories {
            by_key
                .entry((category.name.to_lowercase(), category.preorder))
                .or_insert(category);
        }
        Self { by_key }
    }

    pub fn find(&self, token: &ClassificationToken) -> Option<&Category> {
        self.by_key
            .get(&(token.name.to_lowercase(), token.preorder))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// `max(0, Σincoming - Σcommitted)` per parent external id
pub fn pending_supply_by_parent(levels: &[StagingInventoryLevel]) -> HashMap<String, i64> {
    let mut totals: HashMap<String, (i64, i64)> = HashMap::new();
    for level in levels {
        let entry = totals
            .entry(level.parent_external_id.as_str().to_string())
            .or_default();
        entry.0 += level.incoming;
        entry.1 += level.committed;
    }

    totals
        .into_iter()
        .map(|(parent, (incoming, committed))| (parent, (incoming - committed).max(0)))
        .collect()
}

/// Values of the required pricing fields
pub fn pricing_fields(
    variant: &StagingVariant,
    config: &TransformConfig,
) -> BTreeMap<String, String> {
    config
        .required_pricing_fields
        .iter()
        .filter_map(|field| {
            variant
                .attribute(field)
                .map(|value| (field.clone(), value.trim().to_string()))
        })
        .collect()
}
