//! # qfactory
//!
//! Select and run interchangeable query backends by name.
//!
//! ## Overview
//!
//! A dashboard lets its users pick where a metric comes from: `"mongodb"`,
//! `"mysql"`, `"bigquery"`, or anything else someone has shipped as a
//! plugin. qfactory turns that string plus a free-form JSON configuration
//! into a single number, without the core knowing every backend in advance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌──────────────────────────────┐
//! │ QueryRuntime│────▶│ RunnerFactory │────▶│ Registry: name → constructor │
//! │  (config)   │     │               │     └──────────────────────────────┘
//! └─────────────┘     └───────────────┘          ▲              ▲
//!                                                 │ built-ins    │ RUNNER_PLUGINS
//! ```
//!
//! - **Core** (`qfactory-core`): the `Runner` contract, registry, plugin
//!   loader and factory
//! - **Macros** (`qfactory-macros`): `#[runner_plugin]` for plugin crates
//! - **Runtime** (`qfactory-runtime`): configuration, logging and named
//!   queries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qfactory::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = RunnerFactory::new();
//!     let runner = factory.get("bigquery")?;
//!     let value = runner.compute(&Configuration::new()).await?;
//!     println!("{value}");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `macros`: Enable the `#[runner_plugin]` attribute (default)
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use qfactory_core as core;
#[cfg(feature = "macros")]
pub use qfactory_macros as macros;
pub use qfactory_runtime as runtime;

pub use qfactory_core::{
    BoxedRunner, Configuration, DiscoveryOptions, DiscoveryReport, Number, PluginEntry,
    QueryError, Registry, RegistryError, Runner, RunnerError, RunnerFactory, RunnerProvider,
};
pub use qfactory_runtime::{QFactoryConfig, QueryRuntime, RuntimeError};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use qfactory::prelude::*;
/// ```
pub mod prelude {
    // Runtime - configuration-driven entry point
    pub use qfactory_runtime::{QueryRuntime, RuntimeError};

    // Dispatch layer
    pub use qfactory_core::prelude::*;
    pub use qfactory_core::{DiscoveryOptions, Registry};

    // Plugin declaration
    #[cfg(feature = "macros")]
    pub use qfactory_macros::runner_plugin;
}
