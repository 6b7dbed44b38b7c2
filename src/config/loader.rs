//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, SyncConfig};
use super::secret::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SyncConfig
/// 4. Applies environment variable overrides (CATALOG_SYNC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] if the file is missing or unreadable,
/// a referenced environment variable is unset, the TOML is malformed, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use catalog_sync::config::loader::load_config;
///
/// let config = load_config("catalog-sync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn load_config_from_str(contents: &str) -> Result<SyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        // Placeholders inside comments are left alone
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.parse().map(Some).map_err(|_| {
            SyncError::Configuration(format!("Invalid value '{val}' for environment variable {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using CATALOG_SYNC_* prefix
///
/// Environment variables follow the pattern: CATALOG_SYNC_<SECTION>_<KEY>
/// For example: CATALOG_SYNC_SHOPIFY_SHOP_URL, CATALOG_SYNC_SYNC_LEASE_MINUTES
fn apply_env_overrides(config: &mut SyncConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("CATALOG_SYNC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CATALOG_SYNC_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(SyncError::Configuration(format!(
                    "Invalid CATALOG_SYNC_ENVIRONMENT '{other}'"
                )))
            }
        };
    }

    // Remote platform overrides
    if let Ok(val) = std::env::var("CATALOG_SYNC_SHOPIFY_SHOP_URL") {
        config.shopify.shop_url = val;
    }
    if let Ok(val) = std::env::var("CATALOG_SYNC_SHOPIFY_ACCESS_TOKEN") {
        config.shopify.access_token = secret_string(val);
    }
    if let Ok(val) = std::env::var("CATALOG_SYNC_SHOPIFY_API_VERSION") {
        config.shopify.api_version = val;
    }
    if let Some(attempts) = parse_env("CATALOG_SYNC_SHOPIFY_RETRY_MAX_ATTEMPTS")? {
        config.shopify.retry.max_attempts = attempts;
    }

    // Run lifecycle overrides
    if let Some(minutes) = parse_env("CATALOG_SYNC_SYNC_LEASE_MINUTES")? {
        config.sync.lease_minutes = minutes;
    }
    if let Some(minutes) = parse_env("CATALOG_SYNC_SYNC_ORPHAN_MINUTES")? {
        config.sync.orphan_minutes = minutes;
    }
    if let Some(seconds) = parse_env("CATALOG_SYNC_SYNC_POLL_INTERVAL_SECONDS")? {
        config.sync.poll_interval_seconds = seconds;
    }
    if let Some(seconds) = parse_env("CATALOG_SYNC_SYNC_MAX_WAIT_SECONDS")? {
        config.sync.max_wait_seconds = seconds;
    }

    // Transform overrides
    if let Some(enabled) = parse_env("CATALOG_SYNC_TRANSFORM_BACKUP_BEFORE_REBUILD")? {
        config.transform.backup_before_rebuild = enabled;
    }

    // PostgreSQL overrides
    if let Ok(val) = std::env::var("CATALOG_SYNC_POSTGRESQL_CONNECTION_STRING") {
        config.postgresql.connection_string = secret_string(val);
    }
    if let Some(max) = parse_env("CATALOG_SYNC_POSTGRESQL_MAX_CONNECTIONS")? {
        config.postgresql.max_connections = max;
    }

    // Health overrides
    if let Some(hours) = parse_env("CATALOG_SYNC_HEALTH_WINDOW_HOURS")? {
        config.health.window_hours = hours;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("CATALOG_SYNC_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("CATALOG_SYNC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
