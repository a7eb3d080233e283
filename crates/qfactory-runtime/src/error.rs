//! Runtime error types.

use qfactory_core::QueryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A query failed to resolve or compute.
    #[error("Query '{query}' failed: {source}")]
    Query {
        /// The configured query name, or the backend for ad-hoc runs.
        query: String,
        #[source]
        source: QueryError,
    },

    /// No query with this name is configured.
    #[error("No query named '{0}' is configured")]
    UnknownQuery(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
