use std::fmt;
use std::sync::Arc;

use crate::validate::Validate;

/// A named, typed placeholder in a SQL template.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    validator: Arc<dyn Validate>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, validator: Arc<dyn Validate>) -> Self {
        Self {
            name: name.into(),
            validator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validator(&self) -> &Arc<dyn Validate> {
        &self.validator
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One slot between the literal fragments of a SQL template: either a named
/// parameter or raw SQL text spliced in verbatim.
#[derive(Debug, Clone)]
pub enum TemplateSlot {
    Parameter(Parameter),
    Raw(String),
}

impl TemplateSlot {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// A named parameter slot. The validator decides what caller values are
/// acceptable; reusing the same `Arc` under the same name refers to the same
/// parameter.
pub fn parameter(name: impl Into<String>, validator: Arc<dyn Validate>) -> TemplateSlot {
    TemplateSlot::Parameter(Parameter::new(name, validator))
}

/// A raw SQL slot. The text is spliced into the query with no validation and
/// no parameter binding.
pub fn raw(sql: impl Into<String>) -> TemplateSlot {
    TemplateSlot::Raw(sql.into())
}

/// A SQL statement as literal text fragments interleaved with slots:
/// fragment, slot, fragment, ..., fragment.
///
/// The builder keeps `fragments.len() == slots.len() + 1` at all times, so
/// the interleaving cannot be malformed through this API. Empty fragments
/// are fine; adjacent slots simply have an empty fragment between them.
///
/// # Example
/// ```ignore
/// let template = SqlTemplate::new()
///     .text("SELECT * FROM users WHERE id = ")
///     .parameter("id", validate::string());
/// ```
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    fragments: Vec<String>,
    slots: Vec<TemplateSlot>,
}

impl SqlTemplate {
    pub fn new() -> Self {
        Self {
            fragments: vec![String::new()],
            slots: Vec::new(),
        }
    }

    /// Append literal SQL text after the most recent slot.
    pub fn text(mut self, fragment: impl AsRef<str>) -> Self {
        // new() seeds one fragment, so last_mut always succeeds
        if let Some(last) = self.fragments.last_mut() {
            last.push_str(fragment.as_ref());
        }
        self
    }

    /// Append a slot.
    pub fn slot(mut self, slot: TemplateSlot) -> Self {
        self.slots.push(slot);
        self.fragments.push(String::new());
        self
    }

    /// Shorthand for `.slot(parameter(name, validator))`.
    pub fn parameter(self, name: impl Into<String>, validator: Arc<dyn Validate>) -> Self {
        self.slot(parameter(name, validator))
    }

    /// Shorthand for `.slot(raw(sql))`.
    pub fn raw(self, sql: impl Into<String>) -> Self {
        self.slot(raw(sql))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn slots(&self) -> &[TemplateSlot] {
        &self.slots
    }
}

impl Default for SqlTemplate {
    fn default() -> Self {
        Self::new()
    }
}
