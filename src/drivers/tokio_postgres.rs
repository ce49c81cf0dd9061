use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_postgres::{types::ToSql, Client, NoTls};

use crate::binding::ClientBinding;
use crate::error::{Result, TypedSqlError};
use crate::template::Parameter;

/// PostgreSQL client binding backed by tokio-postgres.
///
/// Renders `$1, $2, ...` parameter references. JSON parameter values are
/// converted to native types on the way in; result rows come back as JSON
/// objects keyed by column name. Driver errors pass through the `Client`
/// error channel without reinterpretation.
pub struct PostgresBinding;

impl PostgresBinding {
    /// Connect to a PostgreSQL database, returning the client handle to
    /// pass into executor calls.
    pub async fn connect(connection_string: &str) -> Result<Client> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(TypedSqlError::client)?;

        // Drive the connection until the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl ClientBinding for PostgresBinding {
    type Client = Client;

    fn render_parameter_reference(&self, ordinal: usize, _parameter: &Parameter) -> String {
        format!("${}", ordinal + 1)
    }

    async fn execute_query(
        &self,
        client: &Self::Client,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<Value>> {
        let converted: Vec<Box<dyn ToSql + Sync + Send>> =
            values.iter().map(json_value_to_tosql).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> = converted
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(sql, &param_refs)
            .await
            .map_err(TypedSqlError::client)?;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Convert a JSON parameter value to a boxed ToSql trait object.
fn json_value_to_tosql(value: &Value) -> Box<dyn ToSql + Sync + Send> {
    match value {
        Value::Null => Box::new(None::<String>),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Box::new(i),
            None => Box::new(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Box::new(s.clone()),
        // Arrays and objects go over as JSONB.
        other => Box::new(other.clone()),
    }
}

/// Convert one result row to a JSON object keyed by column name.
fn row_to_json(row: &tokio_postgres::Row) -> Value {
    let mut object = Map::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_value(row, index));
    }
    Value::Object(object)
}

/// Convert a row value at a given index to a JSON value.
/// Probes common types; unsupported column types come back as null.
fn column_value(row: &tokio_postgres::Row, index: usize) -> Value {
    if let Ok(value) = row.try_get::<_, Option<i32>>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<_, Option<i64>>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<_, Option<f64>>(index) {
        return value
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<_, Option<bool>>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<_, Option<String>>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<_, Option<Value>>(index) {
        return value.unwrap_or(Value::Null);
    }
    Value::Null
}
