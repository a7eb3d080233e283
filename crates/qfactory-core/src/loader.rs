//! Plugin discovery and loading.
//!
//! [`discover_plugins`] walks every [`PluginEntry`] linked under the
//! [`RUNNER_PLUGINS`] extension point and registers it into a
//! [`Registry`]. Each entry is handled in isolation:
//!
//! 1. Entries named in [`DiscoveryOptions::disabled`] are skipped.
//! 2. The entry is checked against the runner contract (name, version).
//! 3. Its constructor is probed once; a panic or a timeout rejects it.
//! 4. The constructor is registered under the declared name.
//!
//! Failures are logged and collected in the returned [`DiscoveryReport`];
//! discovery itself never fails.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{Level, debug, info, span, warn};

use crate::error::{PluginLoadCause, PluginLoadError};
use crate::plugin::{EXTENSION_POINT, PluginEntry, registered_plugins};
use crate::registry::Registry;

// =============================================================================
// Options
// =============================================================================

/// Per-plugin probe timeout used unless the options say otherwise.
pub const DEFAULT_PLUGIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Controls a discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Plugin names that must not be loaded.
    pub disabled: BTreeSet<String>,
    /// Upper bound on a single constructor probe; `None` probes inline
    /// and waits for as long as the constructor takes.
    pub plugin_timeout: Option<Duration>,
    /// Upper bound on the whole pass.
    pub budget: Option<Duration>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            disabled: BTreeSet::new(),
            plugin_timeout: Some(DEFAULT_PLUGIN_TIMEOUT),
            budget: None,
        }
    }
}

impl DiscoveryOptions {
    /// Creates options with the default probe timeout, no budget and
    /// nothing disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevents the named plugin from loading.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    /// Bounds each constructor probe.
    pub fn plugin_timeout(mut self, timeout: Duration) -> Self {
        self.plugin_timeout = Some(timeout);
        self
    }

    /// Probes constructors inline with no timeout.
    ///
    /// A constructor that never returns then stalls the whole pass unless a
    /// budget is set.
    pub fn without_plugin_timeout(mut self) -> Self {
        self.plugin_timeout = None;
        self
    }

    /// Bounds the whole discovery pass.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Timeout for the next probe given the time already spent.
    fn probe_timeout(&self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.budget.map(|b| b.saturating_sub(elapsed));
        match (self.plugin_timeout, remaining) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (t, r) => t.or(r),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// A plugin that was registered successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlugin {
    /// Backend name.
    pub name: String,
    /// Module path of the declaring crate.
    pub origin: &'static str,
    /// Whether an existing backend of the same name was replaced.
    pub replaced: bool,
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Plugins registered, in discovery order.
    pub loaded: Vec<LoadedPlugin>,
    /// Plugins rejected, with the reason.
    pub failed: Vec<PluginLoadError>,
    /// Plugins skipped because they were disabled.
    pub skipped: Vec<String>,
    /// Wall-clock time the pass took.
    pub elapsed: Duration,
}

impl DiscoveryReport {
    /// Returns `true` if no plugin failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Names of the loaded plugins.
    pub fn loaded_names(&self) -> Vec<&str> {
        self.loaded.iter().map(|p| p.name.as_str()).collect()
    }

    /// The failure recorded for `plugin`, if any.
    pub fn failure_for(&self, plugin: &str) -> Option<&PluginLoadError> {
        self.failed.iter().find(|e| e.plugin == plugin)
    }

    /// Number of entries the pass looked at.
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failed.len() + self.skipped.len()
    }
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plugins: {} loaded, {} failed, {} skipped in {:?}",
            self.loaded.len(),
            self.failed.len(),
            self.skipped.len(),
            self.elapsed
        )
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Loads every plugin linked under the extension point into `registry`.
pub fn discover_plugins(registry: &Registry, options: &DiscoveryOptions) -> DiscoveryReport {
    load_plugins(registry, registered_plugins(), options)
}

/// Loads the given entries into `registry`.
///
/// Later entries with the same name replace earlier ones.
pub fn load_plugins(
    registry: &Registry,
    entries: &[PluginEntry],
    options: &DiscoveryOptions,
) -> DiscoveryReport {
    let span = span!(Level::DEBUG, "discover", extension_point = EXTENSION_POINT);
    let _enter = span.enter();

    let started = Instant::now();
    let mut report = DiscoveryReport::default();

    for entry in entries {
        if options.disabled.contains(entry.name) {
            debug!(plugin = entry.name, origin = entry.origin, "Plugin disabled, skipping");
            report.skipped.push(entry.name.to_string());
            continue;
        }

        let elapsed = started.elapsed();
        if options.budget.is_some_and(|budget| elapsed >= budget) {
            record_failure(&mut report, entry, PluginLoadCause::BudgetExhausted);
            continue;
        }

        let outcome = verify(entry, options.probe_timeout(elapsed)).and_then(|()| {
            registry
                .register_boxed(entry.name, entry.constructor())
                .map_err(PluginLoadCause::from)
        });

        match outcome {
            Ok(replaced) => {
                if replaced {
                    warn!(
                        plugin = entry.name,
                        origin = entry.origin,
                        "Plugin replaced an existing backend of the same name"
                    );
                } else {
                    debug!(plugin = entry.name, origin = entry.origin, "Plugin loaded");
                }
                report.loaded.push(LoadedPlugin {
                    name: entry.name.to_string(),
                    origin: entry.origin,
                    replaced,
                });
            }
            Err(cause) => record_failure(&mut report, entry, cause),
        }
    }

    report.elapsed = started.elapsed();
    info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "Plugin discovery finished"
    );
    report
}

pub(crate) fn load_error(entry: &PluginEntry, cause: PluginLoadCause) -> PluginLoadError {
    PluginLoadError {
        plugin: entry.name.to_string(),
        origin: entry.origin,
        cause,
    }
}

fn record_failure(report: &mut DiscoveryReport, entry: &PluginEntry, cause: PluginLoadCause) {
    let error = load_error(entry, cause);
    warn!(
        plugin = entry.name,
        origin = entry.origin,
        error = %error.cause,
        "Plugin failed to load, continuing"
    );
    report.failed.push(error);
}

// =============================================================================
// Constructor probing
// =============================================================================

/// Checks the entry's contract and probes its constructor.
pub(crate) fn verify(entry: &PluginEntry, timeout: Option<Duration>) -> Result<(), PluginLoadCause> {
    entry.check()?;
    probe(*entry, timeout)
}

/// Runs the entry's constructor once, optionally bounded by `timeout`.
///
/// With a timeout the probe runs on its own thread; a constructor that never
/// returns leaves that thread behind and the pass moves on.
fn probe(entry: PluginEntry, timeout: Option<Duration>) -> Result<(), PluginLoadCause> {
    let Some(timeout) = timeout else {
        return construct(&entry);
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("qfactory-probe-{}", entry.name))
        .spawn(move || {
            let _ = tx.send(construct(&entry));
        })
        .map_err(|e| PluginLoadCause::ProbeFailed(e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(PluginLoadCause::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(PluginLoadCause::ProbeFailed(
            "probe thread exited without reporting".to_string(),
        )),
    }
}

fn construct(entry: &PluginEntry) -> Result<(), PluginLoadCause> {
    panic::catch_unwind(|| entry.instantiate())
        .map(drop)
        .map_err(|payload| PluginLoadCause::ConstructorPanicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BigQueryRunner, MongoDbRunner};
    use crate::error::RegistryError;
    use crate::runner::{BoxedRunner, Configuration, Number};

    fn valid() -> BoxedRunner {
        Box::new(BigQueryRunner)
    }

    fn other() -> BoxedRunner {
        Box::new(MongoDbRunner)
    }

    fn broken() -> BoxedRunner {
        panic!("driver library missing")
    }

    fn stuck() -> BoxedRunner {
        thread::sleep(Duration::from_secs(30));
        Box::new(BigQueryRunner)
    }

    #[tokio::test]
    async fn test_broken_plugin_is_isolated() {
        let entries = [
            PluginEntry::new("broken", "tests::broken", broken),
            PluginEntry::new("valid", "tests::valid", valid),
        ];
        let registry = Registry::new();

        let report = load_plugins(&registry, &entries, &DiscoveryOptions::new());

        assert_eq!(report.loaded_names(), vec!["valid"]);
        assert!(!registry.contains("broken"));
        let failure = report.failure_for("broken").unwrap();
        match &failure.cause {
            PluginLoadCause::ConstructorPanicked(msg) => assert_eq!(msg, "driver library missing"),
            other => panic!("unexpected cause: {other:?}"),
        }

        let runner = registry.resolve("valid").unwrap()();
        let value = runner.compute(&Configuration::new()).await.unwrap();
        assert_eq!(value, Number::Integer(3));
    }

    #[test]
    fn test_incompatible_plugin_rejected() {
        let entries = [
            PluginEntry::new("future", "tests::future", valid).with_api_version(0x0002_0000),
            PluginEntry::new("", "tests::nameless", valid),
        ];
        let registry = Registry::new();

        let report = load_plugins(&registry, &entries, &DiscoveryOptions::new());

        assert!(registry.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(
            report.failure_for("future").unwrap().cause,
            PluginLoadCause::Rejected(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            report.failure_for("").unwrap().cause,
            PluginLoadCause::Rejected(RegistryError::InvalidName)
        ));
    }

    #[test]
    fn test_disabled_plugin_skipped() {
        let entries = [PluginEntry::new("valid", "tests::valid", valid)];
        let registry = Registry::new();
        let options = DiscoveryOptions::new().disable("valid");

        let report = load_plugins(&registry, &entries, &options);

        assert_eq!(report.skipped, vec!["valid".to_string()]);
        assert!(report.is_clean());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_plugin_replaces_builtin() {
        let entries = [PluginEntry::new("bigquery", "tests::override", other)];
        let registry = Registry::with_builtins();

        let report = load_plugins(&registry, &entries, &DiscoveryOptions::new());

        assert!(report.loaded[0].replaced);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_blocking_constructor_times_out() {
        let entries = [
            PluginEntry::new("stuck", "tests::stuck", stuck),
            PluginEntry::new("valid", "tests::valid", valid),
        ];
        let registry = Registry::new();
        let options = DiscoveryOptions::new().plugin_timeout(Duration::from_millis(50));

        let report = load_plugins(&registry, &entries, &options);

        assert!(matches!(
            report.failure_for("stuck").unwrap().cause,
            PluginLoadCause::TimedOut(_)
        ));
        assert_eq!(report.loaded_names(), vec!["valid"]);
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_default_options_bound_blocking_constructor() {
        let entries = [
            PluginEntry::new("stuck", "tests::stuck", stuck),
            PluginEntry::new("valid", "tests::valid", valid),
        ];
        let registry = Registry::new();

        let report = load_plugins(&registry, &entries, &DiscoveryOptions::default());

        assert!(matches!(
            report.failure_for("stuck").unwrap().cause,
            PluginLoadCause::TimedOut(timeout) if timeout == DEFAULT_PLUGIN_TIMEOUT
        ));
        assert_eq!(report.loaded_names(), vec!["valid"]);
        assert!(registry.contains("valid"));
        assert!(report.elapsed < Duration::from_secs(30));
    }

    #[test]
    fn test_exhausted_budget_stops_probing() {
        let entries = [
            PluginEntry::new("stuck", "tests::stuck", stuck),
            PluginEntry::new("valid", "tests::valid", valid),
        ];
        let registry = Registry::new();
        let options = DiscoveryOptions::new().budget(Duration::from_millis(50));

        let report = load_plugins(&registry, &entries, &options);

        assert!(matches!(
            report.failure_for("stuck").unwrap().cause,
            PluginLoadCause::TimedOut(_)
        ));
        assert!(matches!(
            report.failure_for("valid").unwrap().cause,
            PluginLoadCause::BudgetExhausted
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_probe_timeout_uses_remaining_budget() {
        let options = DiscoveryOptions::new()
            .plugin_timeout(Duration::from_millis(100))
            .budget(Duration::from_millis(250));
        assert_eq!(
            options.probe_timeout(Duration::from_millis(200)),
            Some(Duration::from_millis(50))
        );
        assert_eq!(
            options.probe_timeout(Duration::ZERO),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            DiscoveryOptions::new().probe_timeout(Duration::ZERO),
            Some(DEFAULT_PLUGIN_TIMEOUT)
        );
        assert_eq!(
            DiscoveryOptions::new()
                .without_plugin_timeout()
                .probe_timeout(Duration::ZERO),
            None
        );
    }

    #[test]
    fn test_report_display() {
        let report = DiscoveryReport {
            loaded: vec![LoadedPlugin {
                name: "valid".into(),
                origin: "tests",
                replaced: false,
            }],
            skipped: vec!["off".into()],
            ..Default::default()
        };
        assert!(report.to_string().starts_with("Plugins: 1 loaded, 0 failed, 1 skipped"));
        assert_eq!(report.total(), 2);
    }
}
