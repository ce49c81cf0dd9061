use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Capability consumed by the query layer: check a value, returning either
/// the validated (possibly transformed) value or a structured failure.
///
/// Validators are handed around as `Arc<dyn Validate>` so they can be shared;
/// sharing the same `Arc` is what makes two template slots refer to "the same"
/// parameter (see `CompiledQuery`).
pub trait Validate: Send + Sync {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure>;
}

/// A single validation problem, located by the path of field names / array
/// indices leading to the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    /// An issue at the root of the validated value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// An issue at a specific path.
    pub fn at(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    fn prefixed(mut self, segment: &str) -> Self {
        self.path.insert(0, segment.to_string());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// The structured outcome of a failed validation: one or more issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub issues: Vec<Issue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct StringValidator;

impl Validate for StringValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(ValidationFailure::single(Issue::new(format!(
                "expected a string, got {}",
                json_type(other)
            )))),
        }
    }
}

/// Validator accepting any JSON string.
pub fn string() -> Arc<dyn Validate> {
    Arc::new(StringValidator)
}

struct IntegerValidator;

impl Validate for IntegerValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            other => Err(ValidationFailure::single(Issue::new(format!(
                "expected an integer, got {}",
                json_type(other)
            )))),
        }
    }
}

/// Validator accepting any JSON integer.
pub fn integer() -> Arc<dyn Validate> {
    Arc::new(IntegerValidator)
}

struct NumberValidator;

impl Validate for NumberValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match value {
            Value::Number(_) => Ok(value.clone()),
            other => Err(ValidationFailure::single(Issue::new(format!(
                "expected a number, got {}",
                json_type(other)
            )))),
        }
    }
}

/// Validator accepting any JSON number.
pub fn number() -> Arc<dyn Validate> {
    Arc::new(NumberValidator)
}

struct BooleanValidator;

impl Validate for BooleanValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            other => Err(ValidationFailure::single(Issue::new(format!(
                "expected a boolean, got {}",
                json_type(other)
            )))),
        }
    }
}

/// Validator accepting any JSON boolean.
pub fn boolean() -> Arc<dyn Validate> {
    Arc::new(BooleanValidator)
}

struct AnyValidator;

impl Validate for AnyValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        Ok(value.clone())
    }
}

/// Validator accepting any value unchanged.
pub fn any() -> Arc<dyn Validate> {
    Arc::new(AnyValidator)
}

struct AbsentValidator;

impl Validate for AbsentValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match value {
            Value::Null => Ok(Value::Null),
            other => Err(ValidationFailure::single(Issue::new(format!(
                "expected no parameters, got {}",
                json_type(other)
            )))),
        }
    }
}

/// Validator accepting only the absence of a value (`null`).
/// Used as the parameter validator of queries with no named parameters.
pub fn absent() -> Arc<dyn Validate> {
    Arc::new(AbsentValidator)
}

struct ObjectValidator {
    fields: Vec<(String, Arc<dyn Validate>)>,
}

impl Validate for ObjectValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ValidationFailure::single(Issue::new(format!(
                    "expected an object, got {}",
                    json_type(other)
                ))))
            }
        };
        let mut validated = Map::with_capacity(self.fields.len());
        let mut issues = Vec::new();
        for (name, validator) in &self.fields {
            match map.get(name) {
                None => issues.push(Issue::at(vec![name.clone()], "required")),
                Some(field) => match validator.validate(field) {
                    Ok(value) => {
                        validated.insert(name.clone(), value);
                    }
                    Err(failure) => {
                        issues.extend(failure.issues.into_iter().map(|i| i.prefixed(name)));
                    }
                },
            }
        }
        if issues.is_empty() {
            // Keys outside the declared field set are dropped.
            Ok(Value::Object(validated))
        } else {
            Err(ValidationFailure::new(issues))
        }
    }
}

/// Validator for an object with exactly the given named fields.
/// Missing fields produce a "required" issue at the field's path; undeclared
/// keys are stripped from the validated output.
pub fn object(fields: Vec<(String, Arc<dyn Validate>)>) -> Arc<dyn Validate> {
    Arc::new(ObjectValidator { fields })
}

struct ArrayValidator {
    element: Arc<dyn Validate>,
}

impl Validate for ArrayValidator {
    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ValidationFailure::single(Issue::new(format!(
                    "expected an array, got {}",
                    json_type(other)
                ))))
            }
        };
        let mut validated = Vec::with_capacity(items.len());
        let mut issues = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match self.element.validate(item) {
                Ok(value) => validated.push(value),
                Err(failure) => {
                    let segment = index.to_string();
                    issues.extend(failure.issues.into_iter().map(|i| i.prefixed(&segment)));
                }
            }
        }
        if issues.is_empty() {
            Ok(Value::Array(validated))
        } else {
            Err(ValidationFailure::new(issues))
        }
    }
}

/// Validator for an array whose every element satisfies `element`.
pub fn array(element: Arc<dyn Validate>) -> Arc<dyn Validate> {
    Arc::new(ArrayValidator { element })
}
