//! Complete command implementation
//!
//! Finishes a run whose bulk operation signalled completion. Takes either the
//! operation id or the webhook body saved to a file.

use super::{
    connect_remote, connect_stores, exit_code_for, load_or_report, print_response, EXIT_CONFIG,
    EXIT_FAILED,
};
use crate::core::sync::{CompletionPayload, SyncOrchestrator};
use crate::domain::{OperationId, Result, SyncError};
use clap::{ArgGroup, Args};
use std::fs;

/// Arguments for the complete command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["operation_id", "payload"])))]
pub struct CompleteArgs {
    /// Remote bulk operation id
    #[arg(long)]
    pub operation_id: Option<String>,

    /// File containing the completion webhook body
    #[arg(long, value_name = "FILE")]
    pub payload: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CompleteArgs {
    fn payload(&self) -> Result<CompletionPayload> {
        match (&self.operation_id, &self.payload) {
            (Some(id), _) => {
                let id = OperationId::new(id.clone()).map_err(SyncError::Validation)?;
                Ok(CompletionPayload::for_operation(&id))
            }
            (None, Some(path)) => {
                let body = fs::read_to_string(path).map_err(|e| {
                    SyncError::Io(format!("Failed to read payload {}: {}", path, e))
                })?;
                CompletionPayload::from_json(&body)
            }
            (None, None) => Err(SyncError::Validation(
                "Either --operation-id or --payload is required".to_string(),
            )),
        }
    }

    /// Execute the complete command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Handling bulk operation completion");

        let payload = match self.payload() {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Invalid completion payload");
                println!("   Error: {e}");
                return Ok(EXIT_FAILED);
            }
        };

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let remote = match connect_remote(&config) {
            Ok(r) => r,
            Err(code) => return Ok(code),
        };
        let stores = match connect_stores(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let orchestrator = match SyncOrchestrator::new(&config, remote, stores) {
            Ok(o) => o,
            Err(e) => {
                println!("❌ Failed to prepare sync");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let response = orchestrator.handle_completion(&payload).await;
        print_response(&response, self.json)?;
        Ok(exit_code_for(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_payload_from_operation_id() {
        let args = CompleteArgs {
            operation_id: Some("gid://shopify/BulkOperation/7".to_string()),
            payload: None,
            json: false,
        };
        assert_eq!(
            args.payload().unwrap().admin_graphql_api_id,
            "gid://shopify/BulkOperation/7"
        );
    }

    #[test]
    fn test_payload_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"admin_graphql_api_id":"gid://shopify/BulkOperation/8","status":"completed"}}"#
        )
        .unwrap();

        let args = CompleteArgs {
            operation_id: None,
            payload: Some(file.path().display().to_string()),
            json: false,
        };
        let payload = args.payload().unwrap();
        assert_eq!(payload.admin_graphql_api_id, "gid://shopify/BulkOperation/8");
        assert_eq!(payload.status.as_deref(), Some("completed"));
    }

    #[test]
    fn test_missing_payload_file() {
        let args = CompleteArgs {
            operation_id: None,
            payload: Some("/nonexistent/payload.json".to_string()),
            json: false,
        };
        assert!(matches!(args.payload(), Err(SyncError::Io(_))));
    }
}
