//! The runner capability contract.
//!
//! Every backend implements [`Runner`]: given an opaque [`Configuration`] it
//! computes a single [`Number`].
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use qfactory_core::{Configuration, Number, Runner, RunnerResult};
//!
//! struct CouchDbRunner;
//!
//! #[async_trait]
//! impl Runner for CouchDbRunner {
//!     async fn compute(&self, _configuration: &Configuration) -> RunnerResult<Number> {
//!         Ok(Number::Integer(4))
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Free-form key/value payload handed to a backend untouched.
pub type Configuration = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Contract Version
// =============================================================================

/// Current runner contract version (1.0), encoded as `major << 16 | minor`.
pub const RUNNER_CONTRACT_VERSION: u32 = 0x0001_0000;

/// A decoded runner contract version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractVersion(pub u32);

impl ContractVersion {
    /// The version this build of the core provides.
    pub const CURRENT: Self = Self(RUNNER_CONTRACT_VERSION);

    /// Major part; must match exactly.
    pub fn major(self) -> u32 {
        self.0 >> 16
    }

    /// Minor part; a plugin may not exceed the host's.
    pub fn minor(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Returns `true` if a backend built against `self` can run on `host`.
    pub fn is_compatible_with(self, host: Self) -> bool {
        self.major() == host.major() && self.minor() <= host.minor()
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

// =============================================================================
// Number
// =============================================================================

/// The numeric result of a query: an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integral result.
    Integer(i64),
    /// Floating-point result.
    Float(f64),
}

impl Number {
    /// Widens the value to `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Returns the integral value, if this is an integer.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(v),
            Self::Float(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

// =============================================================================
// Runner Trait
// =============================================================================

/// The single capability every backend provides.
///
/// Implementations treat `configuration` as read-only and report
/// backend-specific failures as [`RunnerError`].
#[async_trait]
pub trait Runner: Send + Sync {
    /// Computes a number from the given configuration.
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number>;
}

#[async_trait]
impl<R: Runner + ?Sized> Runner for Box<R> {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        (**self).compute(configuration).await
    }
}

/// A boxed runner trait object.
pub type BoxedRunner = Box<dyn Runner>;

/// Zero-argument factory producing a fresh runner on every call.
pub type Constructor = Arc<dyn Fn() -> BoxedRunner + Send + Sync>;

// =============================================================================
// Configuration helpers
// =============================================================================

/// Typed accessors for backends reading their [`Configuration`].
pub trait ConfigurationExt {
    /// Returns the string under `key`, or [`RunnerError::MissingOption`].
    fn required_str(&self, key: &str) -> RunnerResult<&str>;

    /// Returns the string under `key` if present.
    ///
    /// A present key holding a non-string is an [`RunnerError::InvalidOption`].
    fn optional_str(&self, key: &str) -> RunnerResult<Option<&str>>;

    /// Deserializes the whole configuration into `T`.
    fn decode<T: DeserializeOwned>(&self) -> RunnerResult<T>;
}

impl ConfigurationExt for Configuration {
    fn required_str(&self, key: &str) -> RunnerResult<&str> {
        self.optional_str(key)?
            .ok_or_else(|| RunnerError::MissingOption(key.to_string()))
    }

    fn optional_str(&self, key: &str) -> RunnerResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(RunnerError::invalid_option(
                key,
                format!("expected a string, found {other}"),
            )),
        }
    }

    fn decode<T: DeserializeOwned>(&self) -> RunnerResult<T> {
        T::deserialize(serde_json::Value::Object(self.clone()))
            .map_err(|e| RunnerError::Backend(format!("configuration does not decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> Configuration {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("test configs are objects"),
        }
    }

    #[test]
    fn test_contract_version_compatibility() {
        let host = ContractVersion::CURRENT;
        assert!(ContractVersion(0x0001_0000).is_compatible_with(host));
        assert!(!ContractVersion(0x0001_0001).is_compatible_with(host));
        assert!(!ContractVersion(0x0002_0000).is_compatible_with(host));
        assert_eq!(host.to_string(), "1.0");
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(Number::from(3_i64), Number::Integer(3));
        assert_eq!(Number::from(2.5), Number::Float(2.5));
        assert_eq!(Number::Integer(7).as_f64(), 7.0);
        assert_eq!(Number::Float(1.5).as_i64(), None);
        assert_eq!(Number::Integer(3).to_string(), "3");
        assert_eq!(serde_json::to_value(Number::Integer(3)).unwrap(), json!(3));
    }

    #[test]
    fn test_required_str() {
        let cfg = config(json!({ "sql_statement": "select 1", "limit": 5 }));
        assert_eq!(cfg.required_str("sql_statement").unwrap(), "select 1");
        assert_eq!(
            cfg.required_str("return_value"),
            Err(RunnerError::MissingOption("return_value".into()))
        );
        assert!(matches!(
            cfg.required_str("limit"),
            Err(RunnerError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_decode() {
        #[derive(Deserialize)]
        struct Query {
            sql_statement: String,
            #[serde(default)]
            return_value: Option<String>,
        }

        let cfg = config(json!({ "sql_statement": "select 1" }));
        let query: Query = cfg.decode().unwrap();
        assert_eq!(query.sql_statement, "select 1");
        assert!(query.return_value.is_none());

        let bad = config(json!({ "return_value": "n" }));
        assert!(bad.decode::<Query>().is_err());
    }
}
