//! Procedural macros for qfactory.
//!
//! This crate provides:
//!
//! - `#[runner_plugin]` - Declares a backend constructor under the runner
//!   extension point
//!
//! # Runner Plugins
//!
//! A plugin crate depends on `qfactory-core` and this crate, implements
//! [`Runner`] for its backend, and annotates a zero-argument constructor:
//!
//! ```rust,ignore
//! use qfactory_core::{Configuration, Number, Runner, RunnerResult, async_trait};
//! use qfactory_macros::runner_plugin;
//!
//! #[derive(Default)]
//! pub struct CouchDbRunner;
//!
//! #[async_trait]
//! impl Runner for CouchDbRunner {
//!     async fn compute(&self, _configuration: &Configuration) -> RunnerResult<Number> {
//!         Ok(Number::Integer(4))
//!     }
//! }
//!
//! #[runner_plugin("couchdb")]
//! fn couchdb() -> CouchDbRunner {
//!     CouchDbRunner
//! }
//! ```
//!
//! The final binary only has to link the plugin crate for
//! `RunnerFactory::new()` to find it.
//!
//! [`Runner`]: https://docs.rs/qfactory-core/latest/qfactory_core/runner/trait.Runner.html

mod plugin;

use proc_macro::TokenStream;

/// Registers a constructor function as a runner plugin.
///
/// The function is left unchanged. A `PluginEntry` static is appended to the
/// `qfactory_core::RUNNER_PLUGINS` distributed slice, naming the backend and
/// boxing whatever the function returns.
///
/// # Forms
///
/// - `#[runner_plugin]` - registers under the function's name
/// - `#[runner_plugin("name")]` - registers under an explicit name
///
/// The function must be a plain, non-async `fn` with no parameters whose
/// return type implements `Runner`.
#[proc_macro_attribute]
pub fn runner_plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    plugin::runner_plugin(attr.into(), item.into()).into()
}
