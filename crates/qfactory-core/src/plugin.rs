//! Plugin extension point for externally packaged backends.
//!
//! # Overview
//!
//! Plugin crates contribute [`PluginEntry`] statics to the [`RUNNER_PLUGINS`]
//! distributed slice. The slice is assembled by the linker, so the core has
//! no knowledge of which crates implement it; a plugin only depends on the
//! published [`Runner`](crate::Runner) contract.
//!
//! Entries are normally declared with `#[runner_plugin]` from
//! `qfactory-macros`:
//!
//! ```rust,ignore
//! use qfactory_macros::runner_plugin;
//!
//! #[runner_plugin("couchdb")]
//! fn couchdb() -> CouchDbRunner {
//!     CouchDbRunner::default()
//! }
//! ```
//!
//! which expands to roughly:
//!
//! ```rust,ignore
//! #[distributed_slice(qfactory_core::RUNNER_PLUGINS)]
//! static _RUNNER_PLUGIN_COUCHDB: PluginEntry =
//!     PluginEntry::new("couchdb", module_path!(), || Box::new(couchdb()));
//! ```
//!
//! The binary must link the plugin crate (`use my_plugin as _;`) for its
//! entries to be present.

use std::sync::Arc;

use linkme::distributed_slice;

use crate::error::{RegistryError, RegistryResult};
use crate::runner::{BoxedRunner, Constructor, ContractVersion, RUNNER_CONTRACT_VERSION};

/// Documented identifier of the runner extension point.
pub const EXTENSION_POINT: &str = "qfactory.runners";

/// Registry of plugin-provided runner entries.
/// Each plugin crate contributes one entry per backend it ships.
#[distributed_slice]
pub static RUNNER_PLUGINS: [PluginEntry];

/// Returns every entry linked into the current binary.
pub fn registered_plugins() -> &'static [PluginEntry] {
    RUNNER_PLUGINS.static_slice()
}

// ─── PluginEntry ──────────────────────────────────────────────────────────────

/// A static, `Copy` descriptor advertising one backend under the extension
/// point.
///
/// # Memory layout
///
/// `PluginEntry` is `#[repr(C)]`.  Fields **must not be reordered**.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    /// Runner contract version this entry was compiled against.
    pub api_version: u32,

    /// Backend name the plugin registers under.
    pub name: &'static str,

    /// Module path of the declaring crate, for diagnostics.
    pub origin: &'static str,

    /// Zero-argument constructor for the backend.
    pub create: fn() -> BoxedRunner,
}

impl PluginEntry {
    /// Creates an entry targeting the current contract version.
    pub const fn new(name: &'static str, origin: &'static str, create: fn() -> BoxedRunner) -> Self {
        Self {
            api_version: RUNNER_CONTRACT_VERSION,
            name,
            origin,
            create,
        }
    }

    /// Overrides the declared contract version.
    pub const fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    /// The contract version this entry declares.
    pub fn contract_version(&self) -> ContractVersion {
        ContractVersion(self.api_version)
    }

    /// Returns `true` if the entry can run against this build of the core.
    pub fn is_compatible(&self) -> bool {
        self.contract_version()
            .is_compatible_with(ContractVersion::CURRENT)
    }

    /// Checks the static parts of the contract: a usable name and a
    /// compatible version.
    pub fn check(&self) -> RegistryResult<()> {
        if self.name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if !self.is_compatible() {
            return Err(RegistryError::TypeMismatch {
                name: self.name.to_string(),
                expected: ContractVersion::CURRENT,
                found: self.contract_version(),
            });
        }
        Ok(())
    }

    /// Creates a runner from the entry's constructor.
    #[inline]
    pub fn instantiate(&self) -> BoxedRunner {
        (self.create)()
    }

    /// Wraps the constructor for storage in a [`Registry`](crate::Registry).
    pub fn constructor(&self) -> Constructor {
        let create = self.create;
        Arc::new(move || create())
    }
}
