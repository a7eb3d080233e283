//! qfactory Runtime - configuration-driven query execution.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `QFactoryConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - Query execution over a `RunnerFactory` (`QueryRuntime`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [discovery]
//! disabled_plugins = ["http_json"]
//! plugin_timeout_ms = 500
//!
//! [queries.daily_count]
//! backend = "bigquery"
//! options = { sql_statement = "SELECT COUNT(*) FROM events", return_value = "count" }
//! ```
//!
//! ```ignore
//! use qfactory_runtime::QueryRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = QueryRuntime::builder().config_file("qfactory.toml").build()?;
//!
//!     for (name, result) in runtime.run_all().await {
//!         println!("{name}: {:?}", result);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, QFactoryConfig, QueryConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{QueryRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
