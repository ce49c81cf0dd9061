//! typed-sql - compile SQL templates with named, typed parameters into
//! validated, executable queries
//!
//! A template is literal SQL text interleaved with slots: named parameters
//! carrying a validator, or raw SQL spliced in verbatim. Compiling a
//! template against a client binding produces the finished SQL string (with
//! backend-specific parameter references), a validator for caller input,
//! and an executor. Output validators shape-check the returned rows.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use typed_sql::drivers::PostgresBinding;
//! use typed_sql::{one, validate, validate_rows, SqlTemplate};
//!
//! let client = PostgresBinding::connect("postgres://localhost/mydb").await?;
//!
//! // Compile once...
//! let executor = SqlTemplate::new()
//!     .text("SELECT name FROM users WHERE id = ")
//!     .parameter("id", validate::string())
//!     .compile(Arc::new(PostgresBinding))?;
//! assert_eq!(executor.sql(), "SELECT name FROM users WHERE id = $1");
//!
//! // ...execute many times, with rows constrained to exactly one.
//! let user = validate_rows(executor, one(validate::any()));
//! let row = user.execute(&client, json!({"id": "abc"})).await?;
//! ```

pub mod binding;
pub mod compile;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod output;
pub mod template;
pub mod validate;

// Re-export main types for convenient access
pub use binding::ClientBinding;
pub use compile::CompiledQuery;
pub use error::{ClientError, Result, TypedSqlError};
pub use executor::QueryExecutor;
pub use output::{many, one, validate_rows, ValidatedQueryExecutor};
pub use template::{parameter, raw, Parameter, SqlTemplate, TemplateSlot};
pub use validate::{Issue, Validate, ValidationFailure};
