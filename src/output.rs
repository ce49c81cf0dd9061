use std::sync::Arc;

use serde_json::Value;

use crate::binding::ClientBinding;
use crate::error::{Result, TypedSqlError};
use crate::executor::QueryExecutor;
use crate::validate::{array, Issue, Validate, ValidationFailure};

/// Row validator accepting zero or more rows, each satisfying `row`.
pub fn many(row: Arc<dyn Validate>) -> Arc<dyn Validate> {
    array(row)
}

/// Row validator accepting exactly one row, yielding that row unwrapped.
pub fn one(row: Arc<dyn Validate>) -> Arc<dyn Validate> {
    Arc::new(OneRow { rows: array(row) })
}

struct OneRow {
    rows: Arc<dyn Validate>,
}

impl Validate for OneRow {
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationFailure> {
        match self.rows.validate(value)? {
            Value::Array(mut rows) if rows.len() == 1 => Ok(rows.remove(0)),
            Value::Array(rows) => Err(ValidationFailure::single(Issue::new(format!(
                "Expected exactly 1 row, but got {}.",
                rows.len()
            )))),
            _ => Err(ValidationFailure::single(Issue::new(
                "expected an array of rows",
            ))),
        }
    }
}

/// An executor whose returned rows are shape-checked before they reach the
/// caller. Produced by [`validate_rows`]; carries the wrapped executor's SQL
/// metadata unchanged.
pub struct ValidatedQueryExecutor<B: ClientBinding> {
    inner: QueryExecutor<B>,
    validator: Arc<dyn Validate>,
}

/// Wrap an executor so its result is validated by `validator` (typically
/// [`one`] or [`many`]). Row-shape mismatches surface as
/// `TypedSqlError::OutputValidation`; parameter handling and the compiled
/// SQL are untouched.
pub fn validate_rows<B: ClientBinding>(
    executor: QueryExecutor<B>,
    validator: Arc<dyn Validate>,
) -> ValidatedQueryExecutor<B> {
    ValidatedQueryExecutor {
        inner: executor,
        validator,
    }
}

impl<B: ClientBinding> ValidatedQueryExecutor<B> {
    /// The finished SQL text of the wrapped executor.
    pub fn sql(&self) -> &str {
        self.inner.sql()
    }

    /// Execute and validate. For a [`one`] validator the result is the
    /// single row unwrapped; for [`many`] it is the array of rows.
    pub async fn execute(&self, client: &B::Client, parameters: Value) -> Result<Value> {
        let rows = self.inner.execute(client, parameters).await?;
        self.validator
            .validate(&Value::Array(rows))
            .map_err(TypedSqlError::OutputValidation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryBinding;
    use crate::template::SqlTemplate;
    use crate::validate;
    use serde_json::json;

    #[test]
    fn test_many_accepts_empty_and_matching_rows() {
        let rows = many(validate::string());
        assert_eq!(rows.validate(&json!([])).unwrap(), json!([]));
        assert_eq!(rows.validate(&json!(["x"])).unwrap(), json!(["x"]));
        assert_eq!(
            rows.validate(&json!(["x", "y"])).unwrap(),
            json!(["x", "y"])
        );
        assert!(rows.validate(&json!(["x", 1])).is_err());
    }

    #[test]
    fn test_one_unwraps_single_row() {
        let row = one(validate::string());
        assert_eq!(row.validate(&json!(["x"])).unwrap(), json!("x"));
    }

    #[test]
    fn test_one_reports_observed_count() {
        let row = one(validate::string());

        let failure = row.validate(&json!([])).unwrap_err();
        assert_eq!(
            failure.issues[0].message,
            "Expected exactly 1 row, but got 0."
        );

        let failure = row.validate(&json!(["x", "y"])).unwrap_err();
        assert_eq!(
            failure.issues[0].message,
            "Expected exactly 1 row, but got 2."
        );
    }

    #[tokio::test]
    async fn test_validate_rows_wraps_executor() {
        let binding = Arc::new(
            InMemoryBinding::new()
                .with_response(vec![json!("row")])
                .with_response(vec![json!("row"), json!("row2")]),
        );
        let executor = SqlTemplate::new()
            .text("SELECT name FROM t")
            .compile(Arc::clone(&binding))
            .unwrap();
        let sql = executor.sql().to_string();

        let validated = validate_rows(executor, one(validate::string()));
        assert_eq!(validated.sql(), sql);

        // First call: one row, unwrapped.
        let value = validated.execute(&(), Value::Null).await.unwrap();
        assert_eq!(value, json!("row"));

        // Second call: two rows, output validation error.
        let err = validated.execute(&(), Value::Null).await.unwrap_err();
        assert!(err.is_output_validation());
        assert_eq!(
            err.validation_failure().unwrap().issues[0].message,
            "Expected exactly 1 row, but got 2."
        );
    }

    #[tokio::test]
    async fn test_validate_rows_passes_input_errors_through() {
        let binding = Arc::new(InMemoryBinding::new());
        let executor = SqlTemplate::new()
            .text("SELECT * FROM t WHERE id = ")
            .parameter("id", validate::string())
            .compile(Arc::clone(&binding))
            .unwrap();

        let validated = validate_rows(executor, many(validate::any()));
        let err = validated.execute(&(), json!({})).await.unwrap_err();
        assert!(err.is_input_validation());
        assert!(!err.is_output_validation());
    }
}
