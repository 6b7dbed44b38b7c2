//! Bulk query generation from field mappings
//!
//! Only the metafield accessor lines are parameterized. The rest of the query
//! comes from a fixed template containing [`METAFIELDS_PLACEHOLDER`].

use crate::domain::{FieldMapping, Result, SyncError};
use regex::Regex;
use std::collections::HashSet;

/// Marker in the template replaced by the generated metafield lines
pub const METAFIELDS_PLACEHOLDER: &str = "{{METAFIELDS}}";

const METAFIELD_INDENT: &str = "        ";

/// Fixed part of the variant export query
pub const DEFAULT_TEMPLATE: &str = r#"{
  productVariants {
    edges {
      node {
        id
        sku
        title
        price
        compareAtPrice
        product {
          id
          title
          productType
          tags
        }
{{METAFIELDS}}
        inventoryItem {
          inventoryLevels {
            edges {
              node {
                id
                quantities(names: ["incoming", "committed"]) {
                  name
                  quantity
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Hand-maintained query the generator must reproduce with the default mappings
pub const DEFAULT_BASELINE_QUERY: &str = r#"{
  productVariants {
    edges {
      node {
        id
        sku
        title
        price
        compareAtPrice
        product {
          id
          title
          productType
          tags
        }
        season: metafield(namespace: "custom", key: "season") { value }
        collection: metafield(namespace: "custom", key: "collection") { value }
        fabric: metafield(namespace: "custom", key: "fabric") { value }
        fit: metafield(namespace: "custom", key: "fit") { value }
        colorFamily: metafield(namespace: "custom", key: "color_family") { value }
        sizeRange: metafield(namespace: "custom", key: "size_range") { value }
        wholesalePrice: metafield(namespace: "custom", key: "wholesale_price") { value }
        msrp: metafield(namespace: "custom", key: "msrp") { value }
        launchDate: metafield(namespace: "custom", key: "launch_date") { value }
        careInstructions: metafield(namespace: "custom", key: "care_instructions") { value }
        inventoryItem {
          inventoryLevels {
            edges {
              node {
                id
                quantities(names: ["incoming", "committed"]) {
                  name
                  quantity
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Metafield mappings matching [`DEFAULT_BASELINE_QUERY`]
pub fn default_field_mappings() -> Vec<FieldMapping> {
    [
        ("season", "season"),
        ("collection", "collection"),
        ("fabric", "fabric"),
        ("fit", "fit"),
        ("colorFamily", "color_family"),
        ("sizeRange", "size_range"),
        ("wholesalePrice", "wholesale_price"),
        ("msrp", "msrp"),
        ("launchDate", "launch_date"),
        ("careInstructions", "care_instructions"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (alias, key))| FieldMapping::metafield(alias, i as i32 + 1, "custom", key))
    .collect()
}

/// Renders metafield lines into the template after validating the mappings
#[derive(Debug, Clone)]
pub struct QueryGenerator {
    template: String,
    expected_count: usize,
    expected_aliases: Option<Vec<String>>,
    alias_pattern: Regex,
    identifier_pattern: Regex,
}

impl QueryGenerator {
    /// Create a generator
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if the template does not contain the
    /// placeholder exactly once.
    pub fn new(template: impl Into<String>, expected_count: usize) -> Result<Self> {
        let template = template.into();
        let occurrences = template.matches(METAFIELDS_PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(SyncError::Validation(format!(
                "Query template must contain {} exactly once (found {})",
                METAFIELDS_PLACEHOLDER, occurrences
            )));
        }

        let alias_pattern = Regex::new(r"^[a-z][a-zA-Z0-9_]*$")
            .map_err(|e| SyncError::Other(format!("Invalid alias pattern: {}", e)))?;
        let identifier_pattern = Regex::new(r"^[A-Za-z0-9_-]+$")
            .map_err(|e| SyncError::Other(format!("Invalid identifier pattern: {}", e)))?;

        Ok(Self {
            template,
            expected_count,
            expected_aliases: None,
            alias_pattern,
            identifier_pattern,
        })
    }

    /// Require aliases to appear in exactly this order
    pub fn with_expected_aliases(mut self, aliases: Vec<String>) -> Self {
        self.expected_aliases = Some(aliases);
        self
    }

    /// Generate the query text
    ///
    /// Enabled metafield mappings are rendered in `sort_order`. Disabled and
    /// non-metafield mappings are ignored. Nothing is returned unless every
    /// check passes.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] on a count mismatch, a bad alias,
    /// namespace or key, duplicate aliases or sort orders, or an alias order
    /// differing from the expected one.
    pub fn generate(&self, mappings: &[FieldMapping]) -> Result<String> {
        let mut metafields: Vec<&FieldMapping> = mappings
            .iter()
            .filter(|m| m.enabled && m.is_metafield())
            .collect();
        metafields.sort_by_key(|m| m.sort_order);

        if metafields.len() != self.expected_count {
            return Err(SyncError::Validation(format!(
                "Expected {} enabled metafields, found {}",
                self.expected_count,
                metafields.len()
            )));
        }

        let mut aliases = HashSet::new();
        let mut orders = HashSet::new();
        let mut lines = Vec::with_capacity(metafields.len());

        for mapping in &metafields {
            if !self.alias_pattern.is_match(&mapping.path) {
                return Err(SyncError::Validation(format!(
                    "Metafield alias '{}' must be lowerCamelCase",
                    mapping.path
                )));
            }
            if !aliases.insert(mapping.path.as_str()) {
                return Err(SyncError::Validation(format!(
                    "Duplicate metafield alias '{}'",
                    mapping.path
                )));
            }
            if !orders.insert(mapping.sort_order) {
                return Err(SyncError::Validation(format!(
                    "Duplicate sort_order {} (alias '{}')",
                    mapping.sort_order, mapping.path
                )));
            }

            let namespace = self.identifier(mapping, "namespace", &mapping.metafield_namespace)?;
            let key = self.identifier(mapping, "key", &mapping.metafield_key)?;
            lines.push(format!(
                "{}{}: metafield(namespace: \"{}\", key: \"{}\") {{ value }}",
                METAFIELD_INDENT, mapping.path, namespace, key
            ));
        }

        if let Some(expected) = &self.expected_aliases {
            let actual: Vec<&str> = metafields.iter().map(|m| m.path.as_str()).collect();
            if actual != expected.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(SyncError::Validation(format!(
                    "Metafield order [{}] differs from baseline [{}]",
                    actual.join(", "),
                    expected.join(", ")
                )));
            }
        }

        let query = self
            .template
            .replace(METAFIELDS_PLACEHOLDER, &lines.join("\n"));

        tracing::debug!(
            metafields = metafields.len(),
            query_len = query.len(),
            "Generated bulk query"
        );
        Ok(query)
    }

    fn identifier<'a>(
        &self,
        mapping: &FieldMapping,
        what: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str> {
        match value.as_deref() {
            Some(v) if self.identifier_pattern.is_match(v) => Ok(v),
            Some(v) => Err(SyncError::Validation(format!(
                "Metafield '{}' has invalid {} '{}'",
                mapping.path, what, v
            ))),
            None => Err(SyncError::Validation(format!(
                "Metafield '{}' is missing its {}",
                mapping.path, what
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::validator::{metafield_aliases, validate};
    use test_case::test_case;

    fn generator() -> QueryGenerator {
        QueryGenerator::new(DEFAULT_TEMPLATE, 10).unwrap()
    }

    #[test]
    fn test_default_mappings_reproduce_baseline() {
        let query = generator().generate(&default_field_mappings()).unwrap();
        let result = validate(&query, DEFAULT_BASELINE_QUERY);
        assert!(result.matches, "{:?}", result.differences);
    }

    #[test]
    fn test_generation_sorts_by_sort_order() {
        let mut mappings = default_field_mappings();
        mappings.reverse();
        let query = generator().generate(&mappings).unwrap();
        assert_eq!(
            metafield_aliases(&query),
            metafield_aliases(DEFAULT_BASELINE_QUERY)
        );
    }

    #[test_case(9 ; "one too few")]
    #[test_case(11 ; "one too many")]
    fn test_count_mismatch_is_rejected(count: usize) {
        let mut mappings = default_field_mappings();
        mappings.truncate(count.min(10));
        if count > 10 {
            mappings.push(FieldMapping::metafield("extra", 11, "custom", "extra"));
        }
        let err = generator().generate(&mappings).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }

    #[test]
    fn test_disabled_and_scalar_mappings_are_ignored() {
        let mut mappings = default_field_mappings();
        mappings.push(FieldMapping::scalar("sku", 0));
        let mut disabled = FieldMapping::metafield("legacyCode", 99, "custom", "legacy_code");
        disabled.enabled = false;
        mappings.push(disabled);

        let query = generator().generate(&mappings).unwrap();
        assert!(!query.contains("legacyCode"));
    }

    #[test_case("Season", "custom", "season" ; "uppercase alias")]
    #[test_case("season-code", "custom", "season" ; "hyphen in alias")]
    #[test_case("season", "cus tom", "season" ; "space in namespace")]
    #[test_case("season", "custom", "sea\"son" ; "quote in key")]
    fn test_bad_identifiers_are_rejected(alias: &str, namespace: &str, key: &str) {
        let mut mappings = default_field_mappings();
        mappings[0] = FieldMapping::metafield(alias, 1, namespace, key);
        assert!(matches!(
            generator().generate(&mappings),
            Err(SyncError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_sort_order_is_rejected() {
        let mut mappings = default_field_mappings();
        mappings[1].sort_order = mappings[0].sort_order;
        assert!(generator().generate(&mappings).is_err());
    }

    #[test]
    fn test_expected_alias_order_enforced() {
        let mut mappings = default_field_mappings();
        mappings.swap(0, 1);
        let first = mappings[0].sort_order;
        mappings[0].sort_order = mappings[1].sort_order;
        mappings[1].sort_order = first;

        let generator =
            generator().with_expected_aliases(metafield_aliases(DEFAULT_BASELINE_QUERY));
        let err = generator.generate(&mappings).unwrap_err();
        assert!(err.to_string().contains("differs from baseline"));
    }

    #[test]
    fn test_template_requires_placeholder() {
        assert!(QueryGenerator::new("{ productVariants { id } }", 10).is_err());
    }
}
