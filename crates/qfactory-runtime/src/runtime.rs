//! Query runtime: configuration in, numbers out.
//!
//! [`QueryRuntime`] initializes logging, builds a [`RunnerFactory`] according
//! to the `discovery` section, and runs either ad-hoc backends or the named
//! queries from the `queries` section.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use qfactory_runtime::QueryRuntime;
//!
//! // Auto-loads qfactory.toml from the current directory
//! let runtime = QueryRuntime::new();
//! let value = runtime.run_query("daily_count").await?;
//!
//! // Custom configuration path
//! let runtime = QueryRuntime::builder()
//!     .config_file("config/qfactory.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use futures::future::join_all;
use qfactory_core::{
    Configuration, DiscoveryReport, Number, PluginEntry, RunnerFactory, registered_plugins,
};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::config::{ConfigLoader, ConfigResult, QFactoryConfig, QueryConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Runs backends and configured queries through a [`RunnerFactory`].
pub struct QueryRuntime {
    /// The configuration.
    config: QFactoryConfig,
    /// The factory built from `config.discovery`.
    factory: RunnerFactory,
}

impl QueryRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Falls back to default settings if no usable configuration is found.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                QFactoryConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration, discovering linked plugins.
    pub fn from_config(config: &QFactoryConfig) -> Self {
        Self::with_plugins(config, registered_plugins())
    }

    fn with_plugins(config: &QFactoryConfig, plugins: &'static [PluginEntry]) -> Self {
        logging::init_from_config(&config.logging);

        let discovery = &config.discovery;
        let mut builder = RunnerFactory::builder()
            .builtins(discovery.builtins)
            .plugins(plugins);
        builder = if discovery.enabled {
            builder.discovery(discovery.to_options())
        } else {
            builder.without_discovery()
        };
        let factory = builder.build();

        let report = factory.report();
        if report.is_clean() {
            info!(%report, "Runtime initialized from configuration");
        } else {
            warn!(%report, "Runtime initialized, some plugins failed to load");
        }

        Self {
            config: config.clone(),
            factory,
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &QFactoryConfig {
        &self.config
    }

    /// Returns the factory.
    pub fn factory(&self) -> &RunnerFactory {
        &self.factory
    }

    /// Returns the report of the latest discovery pass.
    pub fn report(&self) -> DiscoveryReport {
        self.factory.report()
    }

    /// Returns the configured queries, by name.
    pub fn queries(&self) -> &BTreeMap<String, QueryConfig> {
        &self.config.queries
    }

    /// Runs `backend` with ad-hoc options.
    pub async fn run(&self, backend: &str, options: &Configuration) -> RuntimeResult<Number> {
        self.factory
            .compute(backend, options)
            .await
            .map_err(|source| RuntimeError::Query {
                query: backend.to_string(),
                source,
            })
    }

    /// Runs the configured query `name`.
    pub async fn run_query(&self, name: &str) -> RuntimeResult<Number> {
        let query = self
            .config
            .queries
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownQuery(name.to_string()))?;
        self.execute(name, query).await
    }

    /// Runs every configured query concurrently.
    ///
    /// Results are returned in query-name order; one failing query does not
    /// affect the others.
    pub async fn run_all(&self) -> Vec<(String, RuntimeResult<Number>)> {
        let runs = self.config.queries.iter().map(|(name, query)| async move {
            (name.clone(), self.execute(name, query).await)
        });
        join_all(runs).await
    }

    async fn execute(&self, name: &str, query: &QueryConfig) -> RuntimeResult<Number> {
        let span = span!(Level::DEBUG, "query", query = %name, backend = %query.backend);
        async {
            let result = self
                .factory
                .compute(&query.backend, &query.options)
                .await
                .map_err(|source| RuntimeError::Query {
                    query: name.to_string(),
                    source,
                });
            match &result {
                Ok(value) => debug!(%value, "Query finished"),
                Err(e) => warn!(error = %e, "Query failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl Default for QueryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`QueryRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    plugins: &'static [PluginEntry],
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            plugins: registered_plugins(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: QFactoryConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Discovers from `plugins` instead of the linked extension point.
    pub fn plugins(mut self, plugins: &'static [PluginEntry]) -> Self {
        self.plugins = plugins;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<QueryRuntime> {
        let config = self.config_loader.load()?;
        Ok(QueryRuntime::with_plugins(&config, self.plugins))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
