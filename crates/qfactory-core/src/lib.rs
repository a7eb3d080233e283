//! # qfactory Core
//!
//! The dispatch layer of qfactory.
//!
//! Given a backend name and an opaque configuration, qfactory selects one of
//! several interchangeable [`Runner`] implementations and lets the caller
//! compute a single [`Number`] with it. New backends are added without
//! touching this crate:
//!
//! - **Built-in backends** ([`backends`]) are compiled in and installed by
//!   [`Registry::with_builtins`].
//! - **Runtime registration** goes through [`RunnerFactory::register_backend`].
//! - **Plugins** are separate crates contributing a [`PluginEntry`] to the
//!   [`RUNNER_PLUGINS`] extension point; [`RunnerFactory::new`] discovers
//!   every linked entry once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  get(name)  ┌───────────────┐  resolve  ┌──────────┐
//! │  Caller  │────────────▶│ RunnerFactory │──────────▶│ Registry │
//! └──────────┘             └───────────────┘           └──────────┘
//!      │                           ▲                        ▲
//!      │ compute(&cfg)             │ discover               │ install
//!      ▼                   ┌───────────────┐          ┌──────────┐
//! ┌──────────┐             │ RUNNER_PLUGINS│          │ built-ins│
//! │  Runner  │             └───────────────┘          └──────────┘
//! └──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qfactory_core::{Configuration, Number, RunnerFactory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = RunnerFactory::new();
//!
//!     let mut options = Configuration::new();
//!     options.insert("sql_statement".into(), "SELECT 1".into());
//!
//!     let runner = factory.get("bigquery")?;
//!     assert_eq!(runner.compute(&options).await?, Number::Integer(3));
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod error;
pub mod factory;
pub mod loader;
pub mod plugin;
pub mod registry;
pub mod runner;

pub use backends::{BigQueryRunner, BuiltinBackend, MongoDbRunner, MySqlRunner, builtin_backends};
pub use error::{
    PluginLoadCause, PluginLoadError, PluginLoadResult, QueryError, QueryResult, RegistryError,
    RegistryResult, RunnerError, RunnerResult,
};
pub use factory::{FactoryBuilder, RunnerFactory, RunnerProvider};
pub use loader::{
    DEFAULT_PLUGIN_TIMEOUT, DiscoveryOptions, DiscoveryReport, LoadedPlugin, discover_plugins,
    load_plugins,
};
pub use plugin::{EXTENSION_POINT, PluginEntry, RUNNER_PLUGINS, registered_plugins};
pub use registry::Registry;
pub use runner::{
    BoxedRunner, Configuration, ConfigurationExt, Constructor, ContractVersion, Number,
    RUNNER_CONTRACT_VERSION, Runner,
};

// Used by code generated from `qfactory-macros`.
#[doc(hidden)]
pub use linkme;

pub use async_trait::async_trait;

/// Prelude for common imports.
pub mod prelude {
    pub use super::async_trait;
    pub use super::{
        BoxedRunner, Configuration, ConfigurationExt, Number, QueryError, RegistryError,
        Runner, RunnerError, RunnerFactory, RunnerProvider, RunnerResult,
    };
}
