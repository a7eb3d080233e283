//! Built-in backends shipped with the core.
//!
//! Each backend declares the name it is registered under through
//! [`BuiltinBackend`]. [`builtin_backends`] is the static list used to
//! pre-populate a [`Registry`](crate::Registry); backends shipped by other
//! crates go through the plugin extension point instead.

use std::sync::Arc;

use crate::runner::{BoxedRunner, Constructor, Runner};

pub mod bigquery;
pub mod mongodb;
pub mod mysql;

pub use bigquery::BigQueryRunner;
pub use mongodb::MongoDbRunner;
pub use mysql::MySqlRunner;

/// A backend compiled into the core.
pub trait BuiltinBackend: Runner + Default + 'static {
    /// The name used to select this backend.
    const NAME: &'static str;

    /// Constructor producing a fresh default instance.
    fn constructor() -> Constructor {
        Arc::new(|| Box::new(Self::default()) as BoxedRunner)
    }
}

/// Returns `(name, constructor)` for every built-in backend.
pub fn builtin_backends() -> Vec<(&'static str, Constructor)> {
    vec![
        (MongoDbRunner::NAME, MongoDbRunner::constructor()),
        (MySqlRunner::NAME, MySqlRunner::constructor()),
        (BigQueryRunner::NAME, BigQueryRunner::constructor()),
    ]
}
