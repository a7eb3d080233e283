//! Unified error types for the qfactory core.
//!
//! Registry and plugin errors describe the dispatch layer itself.
//! [`RunnerError`] is owned by backends and passes through the core untouched.

use std::time::Duration;

use thiserror::Error;

use crate::runner::ContractVersion;

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while registering or resolving backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No constructor is registered under the requested name.
    #[error("unknown backend '{name}'")]
    UnknownBackend {
        /// The name that was looked up.
        name: String,
    },

    /// The constructor was built against an incompatible runner contract.
    #[error("backend '{name}' targets runner contract {found}, host provides {expected}")]
    TypeMismatch {
        /// The backend name being registered.
        name: String,
        /// Contract version of the host.
        expected: ContractVersion,
        /// Contract version the backend declares.
        found: ContractVersion,
    },

    /// Backend names must be non-empty.
    #[error("backend name must not be empty")]
    InvalidName,
}

impl RegistryError {
    /// Creates an unknown-backend error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownBackend { name: name.into() }
    }

    /// Returns `true` for [`RegistryError::UnknownBackend`].
    pub fn is_unknown_backend(&self) -> bool {
        matches!(self, Self::UnknownBackend { .. })
    }
}

// =============================================================================
// Plugin Errors
// =============================================================================

/// A single plugin that could not be loaded during discovery.
///
/// Discovery collects these into a [`DiscoveryReport`](crate::loader::DiscoveryReport);
/// only [`RunnerFactory::register_plugin`](crate::RunnerFactory::register_plugin)
/// returns one directly.
#[derive(Debug, Clone, Error)]
#[error("plugin '{plugin}' ({origin}) failed to load: {cause}")]
pub struct PluginLoadError {
    /// Backend name the plugin declared.
    pub plugin: String,
    /// Module path of the crate that contributed the entry.
    pub origin: &'static str,
    /// Why loading failed.
    pub cause: PluginLoadCause,
}

/// Reason a plugin entry was rejected.
#[derive(Debug, Clone, Error)]
pub enum PluginLoadCause {
    /// The entry failed the contract check (version or name).
    #[error(transparent)]
    Rejected(#[from] RegistryError),

    /// The constructor panicked while being probed.
    #[error("constructor panicked: {0}")]
    ConstructorPanicked(String),

    /// The constructor did not return in time.
    #[error("constructor did not finish within {0:?}")]
    TimedOut(Duration),

    /// The overall discovery budget ran out before this entry was probed.
    #[error("discovery budget exhausted")]
    BudgetExhausted,

    /// The probe itself could not run.
    #[error("probe failed: {0}")]
    ProbeFailed(String),
}

// =============================================================================
// Runner Errors
// =============================================================================

/// Errors raised by a backend's [`compute`](crate::Runner::compute).
///
/// The core never inspects or rewraps these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    /// A required configuration key is absent.
    #[error("missing required option '{0}'")]
    MissingOption(String),

    /// A configuration key has an unusable value.
    #[error("invalid option '{key}': {reason}")]
    InvalidOption {
        /// The offending key.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl RunnerError {
    /// Creates an invalid-option error.
    pub fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Error for the one-shot resolve-and-compute path.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Resolving the backend failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The backend failed while computing.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for registering a single plugin entry.
pub type PluginLoadResult<T> = Result<T, PluginLoadError>;

/// Result type for runner computations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Result type for resolve-and-compute.
pub type QueryResult<T> = Result<T, QueryError>;
