//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for catalog-sync using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// catalog-sync - bulk catalog synchronization engine
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(version, about, long_about = None)]
#[command(author = "Catalog Sync Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "catalog-sync.toml",
        env = "CATALOG_SYNC_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CATALOG_SYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full sync: bulk export, ingestion and catalog rebuild
    Sync(commands::sync::SyncArgs),

    /// Finish a run whose bulk operation signalled completion
    Complete(commands::complete::CompleteArgs),

    /// Show recent sync runs
    Status(commands::status::StatusArgs),

    /// Show run-history health and the current alert, if any
    Health(commands::health::HealthArgs),

    /// Print the bulk query and its baseline comparison
    Query(commands::query::QueryArgs),

    /// Rebuild the catalog from current staging data
    Transform(commands::transform::TransformArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sync() {
        let cli = Cli::parse_from(["catalog-sync", "sync"]);
        assert_eq!(cli.config, "catalog-sync.toml");
        match cli.command {
            Commands::Sync(args) => {
                assert!(!args.no_wait);
                assert!(args.max_wait.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_sync_flags() {
        let cli = Cli::parse_from([
            "catalog-sync",
            "sync",
            "--no-wait",
            "--scheduled",
            "--max-wait",
            "600",
        ]);
        match cli.command {
            Commands::Sync(args) => {
                assert!(args.no_wait);
                assert!(args.scheduled);
                assert_eq!(args.max_wait, Some(600));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["catalog-sync", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["catalog-sync", "--log-level", "debug", "health"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Health(_)));
    }

    #[test]
    fn test_cli_parse_complete_requires_source() {
        assert!(Cli::try_parse_from(["catalog-sync", "complete"]).is_err());
        assert!(Cli::try_parse_from([
            "catalog-sync",
            "complete",
            "--operation-id",
            "gid://shopify/BulkOperation/1",
            "--payload",
            "body.json",
        ])
        .is_err());

        let cli = Cli::parse_from([
            "catalog-sync",
            "complete",
            "--operation-id",
            "gid://shopify/BulkOperation/1",
        ]);
        assert!(matches!(cli.command, Commands::Complete(_)));
    }

    #[test]
    fn test_cli_parse_transform() {
        let cli = Cli::parse_from(["catalog-sync", "transform", "--skip-backup"]);
        match cli.command {
            Commands::Transform(args) => assert!(args.skip_backup),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_misc_commands() {
        assert!(matches!(
            Cli::parse_from(["catalog-sync", "query"]).command,
            Commands::Query(_)
        ));
        assert!(matches!(
            Cli::parse_from(["catalog-sync", "validate-config"]).command,
            Commands::ValidateConfig(_)
        ));
        assert!(matches!(
            Cli::parse_from(["catalog-sync", "init"]).command,
            Commands::Init(_)
        ));
    }
}
