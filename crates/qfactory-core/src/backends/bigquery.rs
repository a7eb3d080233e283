//! BigQuery query runner.

use async_trait::async_trait;
use tracing::trace;

use super::BuiltinBackend;
use crate::error::RunnerResult;
use crate::runner::{Configuration, Number, Runner};

/// Runs standard-SQL jobs against BigQuery.
///
/// Expected options are `sql_statement` and `return_value`; the stub does not
/// read them.
#[derive(Debug, Default, Clone, Copy)]
pub struct BigQueryRunner;

impl BuiltinBackend for BigQueryRunner {
    const NAME: &'static str = "bigquery";
}

#[async_trait]
impl Runner for BigQueryRunner {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        trace!(backend = Self::NAME, options = configuration.len(), "Computing");
        Ok(Number::Integer(3))
    }
}
