//! # SQLCourier DB
//!
//! Postgres query client. Every run opens a fresh connection from the
//! execution's credentials and closes it on both exit paths, success or
//! failure. Rows come back as ordered column-name-to-JSON maps ready for
//! report rendering.

use async_trait::async_trait;
use serde_json::Value;
use sqlcourier_core::{CourierError, DbConfig, QueryBackend, Result, ResultRow};
use sqlx::postgres::{PgColumn, PgConnectOptions, PgRow, PgSslMode};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo};
use tracing::warn;

/// Postgres-backed query client.
#[derive(Debug, Default, Clone)]
pub struct QueryClient;

impl QueryClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn run_query(&self, config: &DbConfig, sql: &str) -> Result<Vec<ResultRow>> {
        tracing::debug!("🗄️ Connecting to {}/{}", config.server, config.database);
        let mut conn = connect_options(config)
            .connect()
            .await
            .map_err(|e| CourierError::Database(format!("Connect to {}: {e}", config.server)))?;

        let outcome = sqlx::query(sql).fetch_all(&mut conn).await;
        // Close before surfacing the outcome so the connection is released
        // on the error path too.
        conn.close().await.ok();

        let rows = outcome.map_err(|e| CourierError::Database(format!("Query failed: {e}")))?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.server)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .ssl_mode(ssl_mode_for(config.trust_server_certificate))
}

/// `trust_server_certificate` keeps the original development posture:
/// encrypt when the server offers it, verify nothing. Turning it off
/// demands full certificate verification.
fn ssl_mode_for(trust_server_certificate: bool) -> PgSslMode {
    if trust_server_certificate {
        PgSslMode::Prefer
    } else {
        PgSslMode::VerifyFull
    }
}

/// Decode one row into an ordered column map, keyed by the column's
/// declared type. SQL NULL renders as JSON null; a value that fails to
/// decode also renders as null, with a warning naming the column.
fn row_to_json(row: &PgRow) -> ResultRow {
    let mut map = ResultRow::new();
    for column in row.columns() {
        let value = match column.type_info().name() {
            "BOOL" => decode(row, column, Value::Bool),
            "INT2" => decode(row, column, |v: i16| Value::from(v)),
            "INT4" => decode(row, column, |v: i32| Value::from(v)),
            "INT8" => decode(row, column, |v: i64| Value::from(v)),
            "FLOAT4" => decode(row, column, |v: f32| Value::from(v)),
            "FLOAT8" => decode(row, column, |v: f64| Value::from(v)),
            "NUMERIC" => decode(row, column, numeric_value),
            "JSON" | "JSONB" => decode(row, column, |v: Value| v),
            "UUID" => decode(row, column, |v: uuid::Uuid| Value::String(v.to_string())),
            "TIMESTAMPTZ" => decode(row, column, |v: chrono::DateTime<chrono::Utc>| {
                Value::String(v.to_rfc3339())
            }),
            "TIMESTAMP" => decode(row, column, |v: chrono::NaiveDateTime| {
                Value::String(v.to_string())
            }),
            "DATE" => decode(row, column, |v: chrono::NaiveDate| Value::String(v.to_string())),
            "TIME" => decode(row, column, |v: chrono::NaiveTime| Value::String(v.to_string())),
            // Text types, plus a text attempt for anything unmapped.
            _ => decode(row, column, Value::String),
        };
        map.insert(column.name().to_string(), value);
    }
    map
}

/// NUMERIC renders as its exact decimal text, never a float cast.
fn numeric_value(v: rust_decimal::Decimal) -> Value {
    Value::String(v.to_string())
}

fn decode<'r, T, F>(row: &'r PgRow, column: &PgColumn, into: F) -> Value
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(column.ordinal()) {
        Ok(Some(v)) => into(v),
        Ok(None) => Value::Null,
        Err(e) => {
            warn!(
                "⚠️ Column {} ({}) failed to decode, rendered as null: {e}",
                column.name(),
                column.type_info().name()
            );
            Value::Null
        }
    }
}
