//! Backend registry: the mutable name → constructor table.
//!
//! The registry is populated from three places:
//! - the built-in backends ([`Registry::with_builtins`]),
//! - plugin discovery ([`load_plugins`](crate::loader::load_plugins)),
//! - explicit runtime registration ([`Registry::register`]).
//!
//! Registering a name that already exists replaces the previous entry.
//! Reads take a shared lock only long enough to clone the constructor.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::backends::builtin_backends;
use crate::error::{RegistryError, RegistryResult};
use crate::runner::{BoxedRunner, Constructor, Runner};

/// Thread-safe mapping from backend name to constructor.
pub struct Registry {
    entries: RwLock<HashMap<String, Constructor>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry pre-populated with the built-in backends.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.install_builtins();
        registry
    }

    /// Inserts every built-in backend, replacing same-named entries.
    pub fn install_builtins(&self) {
        let mut entries = self.entries.write();
        for (name, constructor) in builtin_backends() {
            debug!(backend = name, "Registering built-in backend");
            entries.insert(name.to_string(), constructor);
        }
    }

    /// Registers a constructor under `name`.
    ///
    /// Returns `true` when an existing registration was replaced.
    ///
    /// ```rust,ignore
    /// registry.register("couchdb", CouchDbRunner::default)?;
    /// registry.register("fixed", || FixedRunner(42))?;
    /// ```
    pub fn register<F, R>(&self, name: impl Into<String>, constructor: F) -> RegistryResult<bool>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Runner + 'static,
    {
        self.register_boxed(
            name,
            Arc::new(move || Box::new(constructor()) as BoxedRunner),
        )
    }

    /// Registers an already type-erased constructor under `name`.
    pub fn register_boxed(
        &self,
        name: impl Into<String>,
        constructor: Constructor,
    ) -> RegistryResult<bool> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let replaced = self
            .entries
            .write()
            .insert(name.clone(), constructor)
            .is_some();

        if replaced {
            debug!(backend = %name, "Replaced existing backend registration");
        } else {
            debug!(backend = %name, "Registered backend");
        }
        Ok(replaced)
    }

    /// Returns the constructor registered under `name`.
    pub fn resolve(&self, name: &str) -> RegistryResult<Constructor> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::unknown(name))
    }

    /// Removes the registration for `name`, returning whether one existed.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.entries.write().remove(name).is_some();
        if removed {
            debug!(backend = %name, "Unregistered backend");
        }
        removed
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Returns all registered backend names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the number of registered backends.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerResult;
    use crate::runner::{Configuration, Number};
    use async_trait::async_trait;

    struct Fixed(i64);

    #[async_trait]
    impl Runner for Fixed {
        async fn compute(&self, _configuration: &Configuration) -> RunnerResult<Number> {
            Ok(Number::Integer(self.0))
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_with_builtins() {
        let registry = Registry::with_builtins();
        let names: Vec<_> = registry.names().into_iter().collect();
        assert_eq!(names, vec!["bigquery", "mongodb", "mysql"]);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = Registry::with_builtins();
        let err = registry.resolve("nonexistent").err().unwrap();
        assert_eq!(err, RegistryError::unknown("nonexistent"));
        assert!(err.is_unknown_backend());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = Registry::with_builtins();
        assert!(registry.contains("mysql"));
        assert!(!registry.contains("MySQL"));
    }

    #[test]
    fn test_register_empty_name() {
        let registry = Registry::new();
        assert_eq!(
            registry.register("", || Fixed(1)),
            Err(RegistryError::InvalidName)
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = Registry::new();
        assert_eq!(registry.register("x", || Fixed(1)), Ok(false));
        assert_eq!(registry.register("x", || Fixed(2)), Ok(true));
        assert_eq!(registry.len(), 1);

        let runner = registry.resolve("x").unwrap()();
        let value = runner.compute(&Configuration::new()).await.unwrap();
        assert_eq!(value, Number::Integer(2));
    }

    #[test]
    fn test_unregister() {
        let registry = Registry::with_builtins();
        assert!(registry.unregister("mysql"));
        assert!(!registry.unregister("mysql"));
        assert!(registry.resolve("mysql").is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        let registry = Arc::new(Registry::with_builtins());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register(format!("dyn-{i}"), move || Fixed(i)).unwrap();
                    for _ in 0..100 {
                        registry.resolve("bigquery").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 3 + 8);
    }
}
