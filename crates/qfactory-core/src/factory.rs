//! The runner factory: the caller-facing entry point.
//!
//! A [`RunnerFactory`] owns (or shares) a [`Registry`], fills it with the
//! built-in backends, runs plugin discovery once, and then hands out fresh
//! runners by name.
//!
//! # Example
//!
//! ```rust,ignore
//! use qfactory_core::RunnerFactory;
//!
//! let factory = RunnerFactory::new();
//! let runner = factory.get("bigquery")?;
//! let value = runner.compute(&options).await?;
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{PluginLoadCause, PluginLoadResult, QueryResult, RegistryResult};
use crate::loader::{self, DiscoveryOptions, DiscoveryReport, load_plugins};
use crate::plugin::{PluginEntry, registered_plugins};
use crate::registry::Registry;
use crate::runner::{BoxedRunner, Configuration, Number, Runner};

// =============================================================================
// RunnerProvider
// =============================================================================

/// Anything that can produce runners by backend name.
///
/// Callers that only select and run backends can depend on this trait
/// instead of a concrete factory.
pub trait RunnerProvider: Send + Sync {
    /// Constructs a fresh runner for `name`.
    fn get(&self, name: &str) -> RegistryResult<BoxedRunner>;

    /// Names of every available backend.
    fn backends(&self) -> BTreeSet<String>;
}

impl RunnerProvider for Registry {
    fn get(&self, name: &str) -> RegistryResult<BoxedRunner> {
        Ok(self.resolve(name)?())
    }

    fn backends(&self) -> BTreeSet<String> {
        self.names()
    }
}

// =============================================================================
// RunnerFactory
// =============================================================================

/// Selects and constructs runners from a [`Registry`].
pub struct RunnerFactory {
    registry: Arc<Registry>,
    plugins: &'static [PluginEntry],
    discovery: Option<DiscoveryOptions>,
    report: RwLock<DiscoveryReport>,
}

impl RunnerFactory {
    /// Creates a factory with the built-in backends and every linked plugin.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a factory builder.
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    /// The process-wide factory, created with [`RunnerFactory::new`] on
    /// first use.
    pub fn global() -> &'static RunnerFactory {
        static GLOBAL: OnceLock<RunnerFactory> = OnceLock::new();
        GLOBAL.get_or_init(RunnerFactory::new)
    }

    /// Constructs a fresh runner for `name`.
    ///
    /// Every call invokes the constructor anew; the registry is not touched.
    pub fn get(&self, name: &str) -> RegistryResult<BoxedRunner> {
        let constructor = self.registry.resolve(name)?;
        debug!(backend = %name, "Constructing runner");
        Ok(constructor())
    }

    /// Resolves `name` and runs it against `configuration` in one step.
    pub async fn compute(&self, name: &str, configuration: &Configuration) -> QueryResult<Number> {
        let runner = self.get(name)?;
        Ok(runner.compute(configuration).await?)
    }

    /// Registers a backend at runtime, replacing any same-named one.
    pub fn register_backend<F, R>(&self, name: impl Into<String>, constructor: F) -> RegistryResult<bool>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Runner + 'static,
    {
        self.registry.register(name, constructor)
    }

    /// Registers a plugin entry directly, after the same contract check and
    /// constructor probe discovery applies.
    ///
    /// The probe uses the factory's per-plugin timeout, or
    /// [`DEFAULT_PLUGIN_TIMEOUT`](crate::loader::DEFAULT_PLUGIN_TIMEOUT) if
    /// discovery was disabled at build time.
    pub fn register_plugin(&self, entry: &PluginEntry) -> PluginLoadResult<bool> {
        let timeout = match &self.discovery {
            Some(options) => options.plugin_timeout,
            None => Some(loader::DEFAULT_PLUGIN_TIMEOUT),
        };
        loader::verify(entry, timeout)
            .and_then(|()| {
                self.registry
                    .register_boxed(entry.name, entry.constructor())
                    .map_err(PluginLoadCause::from)
            })
            .map_err(|cause| loader::load_error(entry, cause))
    }

    /// Runs plugin discovery again and stores the new report.
    ///
    /// Uses the factory's discovery options, or the defaults if discovery was
    /// disabled at build time.
    pub fn discover_plugins(&self) -> DiscoveryReport {
        let options = self.discovery.clone().unwrap_or_default();
        let report = load_plugins(&self.registry, self.plugins, &options);
        *self.report.write() = report.clone();
        report
    }

    /// Names of every registered backend.
    pub fn backends(&self) -> BTreeSet<String> {
        self.registry.names()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The report of the most recent discovery pass.
    pub fn report(&self) -> DiscoveryReport {
        self.report.read().clone()
    }
}

impl RunnerProvider for RunnerFactory {
    fn get(&self, name: &str) -> RegistryResult<BoxedRunner> {
        RunnerFactory::get(self, name)
    }

    fn backends(&self) -> BTreeSet<String> {
        RunnerFactory::backends(self)
    }
}

impl Default for RunnerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunnerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerFactory")
            .field("registry", &self.registry)
            .field("plugins", &self.plugins.len())
            .field("discovery", &self.discovery)
            .finish()
    }
}

// =============================================================================
// FactoryBuilder
// =============================================================================

/// Builder for a [`RunnerFactory`].
///
/// ```rust,ignore
/// let factory = RunnerFactory::builder()
///     .discovery(DiscoveryOptions::new().disable("couchdb"))
///     .build();
/// ```
pub struct FactoryBuilder {
    builtins: bool,
    discovery: Option<DiscoveryOptions>,
    registry: Option<Arc<Registry>>,
    plugins: &'static [PluginEntry],
}

impl FactoryBuilder {
    /// Creates a builder with built-ins and default discovery enabled.
    pub fn new() -> Self {
        Self {
            builtins: true,
            discovery: Some(DiscoveryOptions::default()),
            registry: None,
            plugins: registered_plugins(),
        }
    }

    /// Whether the built-in backends are installed.
    pub fn builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }

    /// Runs discovery with the given options.
    pub fn discovery(mut self, options: DiscoveryOptions) -> Self {
        self.discovery = Some(options);
        self
    }

    /// Skips plugin discovery at build time.
    pub fn without_discovery(mut self) -> Self {
        self.discovery = None;
        self
    }

    /// Uses a shared registry instead of a fresh one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Discovers from `plugins` instead of the linked extension point.
    pub fn plugins(mut self, plugins: &'static [PluginEntry]) -> Self {
        self.plugins = plugins;
        self
    }

    /// Builds the factory, installing built-ins and then running discovery.
    pub fn build(self) -> RunnerFactory {
        let registry = self.registry.unwrap_or_default();
        if self.builtins {
            registry.install_builtins();
        }

        let report = match &self.discovery {
            Some(options) => load_plugins(&registry, self.plugins, options),
            None => DiscoveryReport::default(),
        };

        info!(
            backends = registry.len(),
            plugins_loaded = report.loaded.len(),
            plugins_failed = report.failed.len(),
            "Runner factory ready"
        );

        RunnerFactory {
            registry,
            plugins: self.plugins,
            discovery: self.discovery,
            report: RwLock::new(report),
        }
    }
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use linkme::distributed_slice;
    use serde_json::json;

    use super::*;
    use crate::error::{QueryError, RegistryError, RunnerError, RunnerResult};
    use crate::plugin::RUNNER_PLUGINS;

    struct Fixed(i64);

    #[async_trait]
    impl Runner for Fixed {
        async fn compute(&self, _configuration: &Configuration) -> RunnerResult<Number> {
            Ok(Number::Integer(self.0))
        }
    }

    struct Failing;

    #[async_trait]
    impl Runner for Failing {
        async fn compute(&self, _configuration: &Configuration) -> RunnerResult<Number> {
            Err(RunnerError::Backend("connection refused".into()))
        }
    }

    fn alpha() -> BoxedRunner {
        Box::new(Fixed(1))
    }

    fn beta() -> BoxedRunner {
        Box::new(Fixed(2))
    }

    fn gamma() -> BoxedRunner {
        panic!("gamma cannot start")
    }

    fn linked() -> BoxedRunner {
        Box::new(Fixed(42))
    }

    #[distributed_slice(RUNNER_PLUGINS)]
    static LINKED_TEST_PLUGIN: PluginEntry = PluginEntry::new("linked-test", module_path!(), linked);

    fn stuck() -> BoxedRunner {
        std::thread::sleep(std::time::Duration::from_secs(30));
        Box::new(Fixed(0))
    }

    static SLOW: [PluginEntry; 2] = [
        PluginEntry::new("stuck", "tests::stuck", stuck),
        PluginEntry::new("alpha", "tests::alpha", alpha),
    ];

    static SCENARIO: [PluginEntry; 3] = [
        PluginEntry::new("alpha", "tests::alpha", alpha),
        PluginEntry::new("beta", "tests::beta", beta),
        PluginEntry::new("gamma", "tests::gamma", gamma),
    ];

    fn options(value: serde_json::Value) -> Configuration {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("test options are objects"),
        }
    }

    fn bare() -> RunnerFactory {
        RunnerFactory::builder().without_discovery().build()
    }

    #[tokio::test]
    async fn test_every_backend_computes() {
        let factory = RunnerFactory::new();
        for name in factory.backends() {
            let runner = factory.get(&name).unwrap();
            assert!(runner.compute(&Configuration::new()).await.is_ok(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_bigquery_with_sql_options() {
        let factory = bare();
        let cfg = options(json!({
            "sql_statement": "SELECT COUNT(*) FROM t",
            "return_value": "count",
        }));
        assert_eq!(factory.compute("bigquery", &cfg).await.unwrap(), Number::Integer(3));
    }

    #[test]
    fn test_get_unknown_backend() {
        let factory = bare();
        let err = factory.get("nonexistent").err().unwrap();
        assert_eq!(err, RegistryError::unknown("nonexistent"));
    }

    #[tokio::test]
    async fn test_compute_errors_keep_their_layer() {
        let factory = bare();
        factory.register_backend("failing", || Failing).unwrap();

        let err = factory.compute("missing", &Configuration::new()).await.unwrap_err();
        assert!(matches!(err, QueryError::Registry(RegistryError::UnknownBackend { .. })));

        let err = factory.compute("failing", &Configuration::new()).await.unwrap_err();
        assert!(matches!(err, QueryError::Runner(RunnerError::Backend(_))));
    }

    #[tokio::test]
    async fn test_register_backend_last_wins() {
        let factory = bare();
        assert_eq!(factory.register_backend("x", || Fixed(10)), Ok(false));
        let value = factory.compute("x", &Configuration::new()).await.unwrap();
        assert_eq!(value, Number::Integer(10));

        assert_eq!(factory.register_backend("x", || Fixed(20)), Ok(true));
        let value = factory.compute("x", &Configuration::new()).await.unwrap();
        assert_eq!(value, Number::Integer(20));
    }

    #[tokio::test]
    async fn test_plugin_scenario() {
        let factory = RunnerFactory::builder()
            .builtins(false)
            .plugins(&SCENARIO)
            .build();

        let cfg = Configuration::new();
        assert_eq!(factory.compute("alpha", &cfg).await.unwrap(), Number::Integer(1));
        assert_eq!(factory.compute("beta", &cfg).await.unwrap(), Number::Integer(2));
        assert!(factory.get("gamma").err().unwrap().is_unknown_backend());

        let report = factory.report();
        assert_eq!(report.loaded_names(), vec!["alpha", "beta"]);
        assert!(matches!(
            report.failure_for("gamma").unwrap().cause,
            PluginLoadCause::ConstructorPanicked(_)
        ));
    }

    #[tokio::test]
    async fn test_default_build_survives_blocking_plugin() {
        let factory = RunnerFactory::builder().plugins(&SLOW).build();

        let report = factory.report();
        assert_eq!(report.loaded_names(), vec!["alpha"]);
        assert!(matches!(
            report.failure_for("stuck").unwrap().cause,
            PluginLoadCause::TimedOut(_)
        ));
        let value = factory.compute("alpha", &Configuration::new()).await.unwrap();
        assert_eq!(value, Number::Integer(1));
    }

    #[test]
    fn test_get_constructs_fresh_instances() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        let factory = bare();
        factory
            .register_backend("counted", || {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Fixed(0)
            })
            .unwrap();
        let before = factory.backends();

        factory.get("counted").unwrap();
        factory.get("counted").unwrap();

        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
        assert_eq!(factory.backends(), before);
    }

    #[test]
    fn test_register_plugin_checks_contract() {
        let factory = bare();
        let entry = PluginEntry::new("alpha", "tests::alpha", alpha);
        assert!(matches!(factory.register_plugin(&entry), Ok(false)));
        assert!(factory.backends().contains("alpha"));

        let future = entry.with_api_version(0x0002_0000);
        let err = factory.register_plugin(&future).unwrap_err();
        assert_eq!(err.plugin, "alpha");
        assert!(matches!(
            err.cause,
            PluginLoadCause::Rejected(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_register_plugin_rejects_panicking_constructor() {
        let factory = bare();
        let entry = PluginEntry::new("gamma", "tests::gamma", gamma);

        let err = factory.register_plugin(&entry).unwrap_err();
        assert_eq!(err.origin, "tests::gamma");
        assert!(matches!(err.cause, PluginLoadCause::ConstructorPanicked(ref msg) if msg == "gamma cannot start"));
        assert!(!factory.backends().contains("gamma"));
        assert!(factory.get("gamma").err().unwrap().is_unknown_backend());
    }

    #[test]
    fn test_linked_plugin_discovered() {
        let factory = RunnerFactory::new();
        assert!(factory.backends().contains("linked-test"));
        assert!(factory.report().loaded_names().contains(&"linked-test"));

        let disabled = RunnerFactory::builder()
            .discovery(DiscoveryOptions::new().disable("linked-test"))
            .build();
        assert!(!disabled.backends().contains("linked-test"));
        assert_eq!(disabled.report().skipped, vec!["linked-test".to_string()]);
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(Registry::new());
        let factory = RunnerFactory::builder()
            .registry(Arc::clone(&registry))
            .without_discovery()
            .build();

        registry.register("late", || Fixed(7)).unwrap();
        assert!(factory.get("late").is_ok());
        assert_eq!(factory.backends().len(), 4);
    }

    #[test]
    fn test_rediscovery_updates_report() {
        let factory = RunnerFactory::builder()
            .without_discovery()
            .plugins(&SCENARIO)
            .build();
        assert_eq!(factory.report().total(), 0);

        let report = factory.discover_plugins();
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(factory.report().failed.len(), 1);
    }

    #[test]
    fn test_provider_abstraction() {
        fn names(provider: &dyn RunnerProvider) -> BTreeSet<String> {
            provider.backends()
        }

        let factory = bare();
        let registry = Registry::with_builtins();
        assert_eq!(names(&factory), names(&registry));
        assert!(RunnerProvider::get(&registry, "mysql").is_ok());
    }

    #[test]
    fn test_global_is_shared() {
        let a = RunnerFactory::global();
        let b = RunnerFactory::global();
        assert!(std::ptr::eq(a, b));
        assert!(a.backends().contains("mongodb"));
    }
}
