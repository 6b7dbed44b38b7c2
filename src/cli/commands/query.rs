//! Query command implementation
//!
//! Prints the bulk query a sync would submit and, for generated queries with
//! a baseline, the line-level differences against it. Touches neither the
//! database nor the remote platform.

use super::{load_or_report, EXIT_CONFIG, EXIT_FAILED, EXIT_OK};
use crate::core::query::{validate, QuerySource, QueryValidation};
use clap::Args;
use std::fs;

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Write the query to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,
}

/// A rendered query and its baseline comparison, if any
struct Rendered {
    query: String,
    validation: Option<QueryValidation>,
}

fn render(source: &QuerySource) -> crate::domain::Result<Rendered> {
    match source {
        QuerySource::Fixed(query) => Ok(Rendered {
            query: query.clone(),
            validation: None,
        }),
        QuerySource::Generated {
            generator,
            mappings,
            baseline,
        } => {
            let query = generator.generate(mappings)?;
            let validation = baseline.as_deref().map(|b| validate(&query, b));
            Ok(Rendered { query, validation })
        }
    }
}

impl QueryArgs {
    /// Execute the query command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let rendered = match QuerySource::from_config(&config.query).and_then(|s| render(&s)) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Query generation failed");
                println!("❌ Query generation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match &self.output {
            Some(path) => {
                fs::write(path, &rendered.query)?;
                println!("✅ Query written to {path}");
            }
            None => println!("{}", rendered.query),
        }

        match rendered.validation {
            None => Ok(EXIT_OK),
            Some(validation) if validation.matches => {
                eprintln!("✅ Generated query matches the baseline");
                Ok(EXIT_OK)
            }
            Some(validation) => {
                eprintln!("❌ Generated query differs from the baseline:");
                for difference in &validation.differences {
                    eprintln!("   {difference}");
                }
                Ok(EXIT_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::core::query::{default_field_mappings, DEFAULT_BASELINE_QUERY};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_render_fixed_query() {
        let source = QuerySource::from_config(&QueryConfig::default()).unwrap();
        let rendered = render(&source).unwrap();
        assert_eq!(rendered.query, DEFAULT_BASELINE_QUERY);
        assert!(rendered.validation.is_none());
    }

    #[test]
    fn test_render_reports_baseline_drift() {
        let mut baseline = NamedTempFile::new().unwrap();
        write!(
            baseline,
            "{}",
            DEFAULT_BASELINE_QUERY.replace("key: \"season\"", "key: \"season_code\"")
        )
        .unwrap();

        let config = QueryConfig {
            baseline_path: Some(baseline.path().display().to_string()),
            expected_metafield_count: 10,
            field_mappings: default_field_mappings(),
        };
        let rendered = render(&QuerySource::from_config(&config).unwrap()).unwrap();
        let validation = rendered.validation.unwrap();
        assert!(!validation.matches);
        assert_eq!(validation.differences.len(), 1);
    }
}
