//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DiscoveryConfig, LogOutput, LoggingConfig, QFactoryConfig, QueryConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &QFactoryConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_discovery_config(&config.discovery)?;
    for (name, query) in &config.queries {
        validate_query_config(name, query)?;
    }
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }

    Ok(())
}

/// Validates discovery settings.
fn validate_discovery_config(discovery: &DiscoveryConfig) -> ConfigResult<()> {
    if discovery.budget_ms == Some(0) {
        return Err(ConfigError::validation(
            "Discovery budget must be greater than 0",
        ));
    }

    if discovery.disabled_plugins.iter().any(|name| name.is_empty()) {
        return Err(ConfigError::validation("Disabled plugin names cannot be empty"));
    }

    Ok(())
}

/// Validates a single named query.
fn validate_query_config(name: &str, query: &QueryConfig) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::validation("Query names cannot be empty"));
    }

    if query.backend.is_empty() {
        return Err(ConfigError::missing_field(format!("queries.{name}.backend")));
    }

    Ok(())
}
