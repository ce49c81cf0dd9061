use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::template::Parameter;

/// The pair of capabilities that makes a compiled query executable against
/// one particular database backend.
///
/// Implementations are responsible for:
/// - Rendering the backend's placeholder token for a parameter at a given
///   ordinal (e.g. `$1`, `$2`, ... for PostgreSQL)
/// - Executing a finished SQL string with positional values against a client
///   handle, returning rows as opaque JSON values
///
/// Driver failures go through the `Client` error channel untouched; this
/// layer never retries or reinterprets them.
#[async_trait]
pub trait ClientBinding: Send + Sync {
    /// The backend connection handle, owned by the caller and passed in per
    /// call.
    type Client: Send + Sync;

    /// Render the placeholder token for the parameter holding the given
    /// ordinal in the compiled parameter list.
    fn render_parameter_reference(&self, ordinal: usize, parameter: &Parameter) -> String;

    /// Execute `sql` with `values` in compiled parameter order.
    async fn execute_query(
        &self,
        client: &Self::Client,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<Value>>;
}
