//! Configuration module for the qfactory runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, plugin discovery, and named queries.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DiscoveryConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, QFactoryConfig, QueryConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
