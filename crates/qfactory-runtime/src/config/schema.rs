//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use qfactory_core::{Configuration, DEFAULT_PLUGIN_TIMEOUT, DiscoveryOptions};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QFactoryConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Backend and plugin discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Named queries, each selecting a backend and its options.
    #[serde(default)]
    pub queries: BTreeMap<String, QueryConfig>,
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `qfactory_core = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: BTreeMap::new(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub close: bool,
}

// =============================================================================
// Discovery
// =============================================================================

/// Controls how the runner factory is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Run plugin discovery at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Install the built-in backends.
    #[serde(default = "default_true")]
    pub builtins: bool,

    /// Plugin names that must not be loaded.
    #[serde(default)]
    pub disabled_plugins: Vec<String>,

    /// Upper bound on a single plugin constructor, in milliseconds.
    /// `0` probes constructors inline with no timeout.
    #[serde(default = "default_plugin_timeout_ms")]
    pub plugin_timeout_ms: u64,

    /// Upper bound on the whole discovery pass, in milliseconds.
    #[serde(default)]
    pub budget_ms: Option<u64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            builtins: true,
            disabled_plugins: Vec::new(),
            plugin_timeout_ms: default_plugin_timeout_ms(),
            budget_ms: None,
        }
    }
}

impl DiscoveryConfig {
    /// Converts to loader options.
    pub fn to_options(&self) -> DiscoveryOptions {
        let mut options = DiscoveryOptions::new();
        for name in &self.disabled_plugins {
            options = options.disable(name.as_str());
        }
        options = match self.plugin_timeout_ms {
            0 => options.without_plugin_timeout(),
            ms => options.plugin_timeout(Duration::from_millis(ms)),
        };
        if let Some(ms) = self.budget_ms {
            options = options.budget(Duration::from_millis(ms));
        }
        options
    }
}

fn default_true() -> bool {
    true
}

fn default_plugin_timeout_ms() -> u64 {
    DEFAULT_PLUGIN_TIMEOUT.as_millis() as u64
}

// =============================================================================
// Queries
// =============================================================================

/// A named query: the backend to run and the options handed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Backend name, as registered in the factory.
    pub backend: String,

    /// Opaque options passed to the backend untouched.
    #[serde(default)]
    pub options: Configuration,
}
