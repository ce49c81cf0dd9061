use std::sync::Arc;

use serde_json::Value;

use crate::binding::ClientBinding;
use crate::compile::CompiledQuery;
use crate::error::{Result, TypedSqlError};

/// A compiled query bound to a client binding, ready to execute.
///
/// Construction is pure; the only suspension point of a call is the
/// binding's `execute_query`. The executor holds no mutable state, so one
/// instance may be invoked concurrently from independent tasks.
pub struct QueryExecutor<B: ClientBinding> {
    query: CompiledQuery,
    binding: Arc<B>,
}

impl<B: ClientBinding> std::fmt::Debug for QueryExecutor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("sql", &self.query.sql())
            .finish_non_exhaustive()
    }
}

impl<B: ClientBinding> QueryExecutor<B> {
    pub(crate) fn new(query: CompiledQuery, binding: Arc<B>) -> Self {
        Self { query, binding }
    }

    /// The finished SQL text this executor runs.
    pub fn sql(&self) -> &str {
        self.query.sql()
    }

    /// The underlying compiled artifact.
    pub fn compiled(&self) -> &CompiledQuery {
        &self.query
    }

    /// Validate `parameters`, project them into positional order, and run
    /// the query against `client`.
    ///
    /// Queries without parameters take `Value::Null`. Rows come back as
    /// opaque JSON values; shape-check them with `output::validate_rows`.
    pub async fn execute(&self, client: &B::Client, parameters: Value) -> Result<Vec<Value>> {
        let validated = self
            .query
            .parameter_validator()
            .validate(&parameters)
            .map_err(TypedSqlError::InputValidation)?;

        // Positional contract with the binding: values in parameter_names
        // order. The validator has already guaranteed every name is present.
        let values: Vec<Value> = self
            .query
            .parameter_names()
            .iter()
            .map(|name| validated.get(name).cloned().unwrap_or(Value::Null))
            .collect();

        tracing::debug!(sql = %self.query.sql(), "executing query");

        self.binding
            .execute_query(client, self.query.sql(), &values)
            .await
    }
}
