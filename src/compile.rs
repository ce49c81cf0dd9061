use std::collections::HashMap;
use std::sync::Arc;

use crate::binding::ClientBinding;
use crate::error::{Result, TypedSqlError};
use crate::executor::QueryExecutor;
use crate::template::{Parameter, SqlTemplate, TemplateSlot};
use crate::validate::{absent, object, Validate};

/// The immutable artifact produced by compiling a template against one
/// client binding: the finished SQL text, the distinct parameter list in
/// first-occurrence order, the validator for caller-supplied parameters,
/// and the per-slot ordinal map.
///
/// Holds no mutable state; safe to share across concurrent executions.
pub struct CompiledQuery {
    sql: String,
    parameter_names: Vec<String>,
    parameter_validator: Arc<dyn Validate>,
    slot_ordinals: Vec<Option<usize>>,
}

impl CompiledQuery {
    pub(crate) fn new<B: ClientBinding>(template: &SqlTemplate, binding: &B) -> Result<Self> {
        let mut parameters: Vec<&Parameter> = Vec::new();
        let mut ordinals_by_name: HashMap<&str, usize> = HashMap::new();
        let mut slot_ordinals = Vec::with_capacity(template.slots().len());

        let mut sql = String::with_capacity(256);
        sql.push_str(&template.fragments()[0]);

        for (index, slot) in template.slots().iter().enumerate() {
            match slot {
                TemplateSlot::Parameter(param) => {
                    if param.name().is_empty() {
                        return Err(TypedSqlError::InvalidTemplateArgument(index));
                    }
                    let ordinal = match ordinals_by_name.get(param.name()) {
                        Some(&existing) => {
                            if !same_validator(parameters[existing].validator(), param.validator())
                            {
                                return Err(TypedSqlError::DuplicateParameterName(
                                    param.name().to_string(),
                                ));
                            }
                            existing
                        }
                        None => {
                            let ordinal = parameters.len();
                            parameters.push(param);
                            ordinals_by_name.insert(param.name(), ordinal);
                            ordinal
                        }
                    };
                    slot_ordinals.push(Some(ordinal));
                    sql.push_str(&binding.render_parameter_reference(ordinal, param));
                }
                TemplateSlot::Raw(text) => {
                    slot_ordinals.push(None);
                    sql.push_str(text);
                }
            }
            sql.push_str(&template.fragments()[index + 1]);
        }

        let parameter_validator = if parameters.is_empty() {
            absent()
        } else {
            object(
                parameters
                    .iter()
                    .map(|p| (p.name().to_string(), Arc::clone(p.validator())))
                    .collect(),
            )
        };
        let parameter_names: Vec<String> =
            parameters.iter().map(|p| p.name().to_string()).collect();

        tracing::debug!(
            sql = %sql,
            parameters = parameter_names.len(),
            "compiled SQL template"
        );

        Ok(Self {
            sql,
            parameter_names,
            parameter_validator,
            slot_ordinals,
        })
    }

    /// The finished SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Distinct parameter names in first-occurrence order.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Validator for the caller-supplied parameter mapping. Accepts only
    /// `null` when the query has no parameters.
    pub fn parameter_validator(&self) -> &Arc<dyn Validate> {
        &self.parameter_validator
    }

    /// Per original slot, the ordinal into `parameter_names`, or `None` for
    /// raw slots.
    pub fn slot_ordinals(&self) -> &[Option<usize>] {
        &self.slot_ordinals
    }
}

/// Two validator handles count as the same validator only if they share the
/// same allocation. Structurally identical but separately constructed
/// validators are distinct.
fn same_validator(a: &Arc<dyn Validate>, b: &Arc<dyn Validate>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const u8,
        Arc::as_ptr(b) as *const u8,
    )
}

impl SqlTemplate {
    /// Compile this template against a client binding, producing an executor
    /// ready to run the query. Compilation is synchronous, performs no I/O,
    /// and is intended to run once per query definition.
    pub fn compile<B: ClientBinding>(self, binding: Arc<B>) -> Result<QueryExecutor<B>> {
        let query = CompiledQuery::new(&self, binding.as_ref())?;
        Ok(QueryExecutor::new(query, binding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypedSqlError;
    use crate::template::{parameter, raw};
    use crate::validate;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    // Binding that renders PostgreSQL-style positional markers.
    struct Dollars;

    #[async_trait]
    impl ClientBinding for Dollars {
        type Client = ();

        fn render_parameter_reference(&self, ordinal: usize, _parameter: &Parameter) -> String {
            format!("${}", ordinal + 1)
        }

        async fn execute_query(
            &self,
            _client: &(),
            _sql: &str,
            _values: &[Value],
        ) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_compile_single_parameter() {
        let executor = SqlTemplate::new()
            .text("SELECT * FROM t WHERE id = ")
            .parameter("id", validate::string())
            .compile(Arc::new(Dollars))
            .unwrap();

        assert_eq!(executor.sql(), "SELECT * FROM t WHERE id = $1");
        assert_eq!(executor.compiled().parameter_names(), ["id"]);
        assert_eq!(executor.compiled().slot_ordinals(), [Some(0)]);
    }

    #[test]
    fn test_compile_no_parameters() {
        let executor = SqlTemplate::new()
            .text("SELECT 1")
            .compile(Arc::new(Dollars))
            .unwrap();

        assert_eq!(executor.sql(), "SELECT 1");
        assert!(executor.compiled().parameter_names().is_empty());
        // Only the absence of parameters is accepted.
        let validator = executor.compiled().parameter_validator();
        assert!(validator.validate(&Value::Null).is_ok());
        assert!(validator.validate(&json!({})).is_err());
    }

    #[test]
    fn test_compile_raw_slot_spliced_verbatim() {
        let executor = SqlTemplate::new()
            .text("SELECT * FROM t ")
            .raw("ORDER BY id")
            .text(" LIMIT ")
            .parameter("limit", validate::integer())
            .compile(Arc::new(Dollars))
            .unwrap();

        assert_eq!(executor.sql(), "SELECT * FROM t ORDER BY id LIMIT $1");
        assert_eq!(executor.compiled().parameter_names(), ["limit"]);
        assert_eq!(executor.compiled().slot_ordinals(), [None, Some(0)]);
    }

    #[test]
    fn test_shared_validator_reuses_ordinal() {
        let id = validate::string();
        let executor = SqlTemplate::new()
            .text("SELECT * FROM t WHERE a = ")
            .parameter("id", id.clone())
            .text(" OR b = ")
            .parameter("id", id)
            .compile(Arc::new(Dollars))
            .unwrap();

        assert_eq!(executor.sql(), "SELECT * FROM t WHERE a = $1 OR b = $1");
        assert_eq!(executor.compiled().parameter_names(), ["id"]);
        assert_eq!(executor.compiled().slot_ordinals(), [Some(0), Some(0)]);
    }

    #[test]
    fn test_same_name_different_validator_is_duplicate() {
        let err = SqlTemplate::new()
            .text("SELECT * FROM t WHERE a = ")
            .parameter("id", validate::string())
            .text(" OR b = ")
            .parameter("id", validate::string())
            .compile(Arc::new(Dollars))
            .unwrap_err();

        assert!(err.is_duplicate_parameter_name());
        match err {
            TypedSqlError::DuplicateParameterName(name) => assert_eq!(name, "id"),
            other => panic!("expected DuplicateParameterName, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_parameter_name_is_invalid_argument() {
        let err = SqlTemplate::new()
            .text("SELECT * FROM t WHERE a = ")
            .parameter("a", validate::string())
            .slot(parameter("", validate::string()))
            .compile(Arc::new(Dollars))
            .unwrap_err();

        assert!(err.is_invalid_template_argument());
        match err {
            TypedSqlError::InvalidTemplateArgument(index) => assert_eq!(index, 1),
            other => panic!("expected InvalidTemplateArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_ordinals_skip_raw_slots() {
        let executor = SqlTemplate::new()
            .text("SELECT * FROM t WHERE a = ")
            .parameter("a", validate::string())
            .text(" ")
            .slot(raw("AND"))
            .text(" b = ")
            .parameter("b", validate::integer())
            .compile(Arc::new(Dollars))
            .unwrap();

        assert_eq!(executor.sql(), "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(executor.compiled().parameter_names(), ["a", "b"]);
        assert_eq!(
            executor.compiled().slot_ordinals(),
            [Some(0), None, Some(1)]
        );
    }
}
