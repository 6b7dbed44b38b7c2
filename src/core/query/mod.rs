//! Bulk query generation and validation
//!
//! A sync either submits a fixed, known-good query or one generated from the
//! configured field mappings. Generated queries are proven against a baseline
//! before they are ever submitted.

pub mod generator;
pub mod validator;

pub use generator::{
    default_field_mappings, QueryGenerator, DEFAULT_BASELINE_QUERY, DEFAULT_TEMPLATE,
    METAFIELDS_PLACEHOLDER,
};
pub use validator::{metafield_aliases, normalize, validate, QueryValidation};

use crate::config::QueryConfig;
use crate::domain::{FieldMapping, Result, SyncError};

/// Where the bulk query text comes from
#[derive(Debug, Clone)]
pub enum QuerySource {
    /// Submit this text verbatim
    Fixed(String),
    /// Generate from mappings; when a baseline is present the output must match it
    Generated {
        generator: QueryGenerator,
        mappings: Vec<FieldMapping>,
        baseline: Option<String>,
    },
}

impl QuerySource {
    /// Build the query source described by configuration
    ///
    /// With no field mappings the built-in baseline query is used as-is.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the baseline file cannot be read.
    pub fn from_config(config: &QueryConfig) -> Result<Self> {
        if config.field_mappings.is_empty() {
            return Ok(QuerySource::Fixed(DEFAULT_BASELINE_QUERY.to_string()));
        }

        let baseline = config
            .baseline_path
            .as_deref()
            .map(|path| {
                std::fs::read_to_string(path).map_err(|e| {
                    SyncError::Configuration(format!(
                        "Failed to read query baseline {}: {}",
                        path, e
                    ))
                })
            })
            .transpose()?;

        let mut generator = QueryGenerator::new(DEFAULT_TEMPLATE, config.expected_metafield_count)?;
        if let Some(baseline) = &baseline {
            generator = generator.with_expected_aliases(metafield_aliases(baseline));
        }

        Ok(QuerySource::Generated {
            generator,
            mappings: config.field_mappings.clone(),
            baseline,
        })
    }

    /// Produce the query text to submit
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if generation fails or the generated
    /// text differs from the baseline.
    pub fn resolve(&self) -> Result<String> {
        match self {
            QuerySource::Fixed(query) => Ok(query.clone()),
            QuerySource::Generated {
                generator,
                mappings,
                baseline,
            } => {
                let query = generator.generate(mappings)?;
                if let Some(baseline) = baseline {
                    let validation = validate(&query, baseline);
                    if !validation.matches {
                        return Err(SyncError::Validation(format!(
                            "Generated query differs from baseline: {}",
                            validation.differences.join("; ")
                        )));
                    }
                }
                Ok(query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(mappings: Vec<FieldMapping>, baseline_path: Option<String>) -> QueryConfig {
        QueryConfig {
            baseline_path,
            expected_metafield_count: 10,
            field_mappings: mappings,
        }
    }

    #[test]
    fn test_no_mappings_uses_builtin_query() {
        let source = QuerySource::from_config(&QueryConfig::default()).unwrap();
        assert!(matches!(source, QuerySource::Fixed(_)));
        assert_eq!(source.resolve().unwrap(), DEFAULT_BASELINE_QUERY);
    }

    #[test]
    fn test_generated_query_checked_against_baseline_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_BASELINE_QUERY.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let source =
            QuerySource::from_config(&config(default_field_mappings(), Some(path))).unwrap();
        let query = source.resolve().unwrap();
        assert!(validate(&query, DEFAULT_BASELINE_QUERY).matches);
    }

    #[test]
    fn test_drift_from_baseline_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_BASELINE_QUERY.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut mappings = default_field_mappings();
        mappings[9] = FieldMapping::metafield("careInstructions", 10, "custom", "care");

        let source = QuerySource::from_config(&config(mappings, Some(path))).unwrap();
        let err = source.resolve().unwrap_err();
        assert!(err.to_string().contains("differs from baseline"));
    }

    #[test]
    fn test_missing_baseline_file_is_config_error() {
        let result = QuerySource::from_config(&config(
            default_field_mappings(),
            Some("/nonexistent/baseline.graphql".to_string()),
        ));
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }
}
