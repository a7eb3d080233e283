//! MySQL query runner.

use async_trait::async_trait;
use tracing::trace;

use super::BuiltinBackend;
use crate::error::RunnerResult;
use crate::runner::{Configuration, Number, Runner};

/// Runs SQL statements against MySQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlRunner;

impl BuiltinBackend for MySqlRunner {
    const NAME: &'static str = "mysql";
}

#[async_trait]
impl Runner for MySqlRunner {
    async fn compute(&self, configuration: &Configuration) -> RunnerResult<Number> {
        trace!(backend = Self::NAME, options = configuration.len(), "Computing");
        Ok(Number::Integer(2))
    }
}
