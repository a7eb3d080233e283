//! MongoDB query runner.

use async_trait::async_trait;
use tracing::trace;

use super::BuiltinBackend;
use crate::error::RunnerResult;
use crate::runner::{Configuration, Number, Runner};

/// Runs aggregation pipelines against MongoDB.
///
/// Driver integration lives outside this crate; the runner answers with a
/// fixed value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoDbRunner;

impl BuiltinBackend for MongoDbRunner {
    const NAME: &'static str = "mongodb";
}

#[async_trait]
impl Runner for MongoDbRunner {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        trace!(backend = Self::NAME, options = configuration.len(), "Computing");
        Ok(Number::Integer(1))
    }
}
