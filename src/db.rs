//! Database fetch: one connection, one fixed statement, one row.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::warn;
use serde_json::{Map, Value};
use tokio_postgres::types::Type;
use tokio_postgres::{NoTls, Row};

use crate::config::DatabaseSettings;
use crate::error::FetchError;

/// Fetch the first row of the configured table as a column-keyed JSON map.
///
/// Opens a dedicated connection for this call and releases it on every exit
/// path. An empty table yields an empty map, not an error.
pub async fn fetch_first_row(db: &DatabaseSettings) -> Result<Map<String, Value>, FetchError> {
    let (client, connection) = tokio_postgres::connect(&db.connection_string(), NoTls)
        .await
        .map_err(FetchError::Connection)?;

    // The driver requires its connection future to be polled for the client
    // to make progress; it resolves once the client is dropped.
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!("postgres connection terminated: {}", e);
        }
    });

    let statement = format!("SELECT * FROM {} LIMIT 1", db.table);
    let result = match client.query(&statement, &[]).await {
        Ok(rows) => match rows.first() {
            Some(row) => row_to_map(row),
            None => Ok(Map::new()),
        },
        Err(e) => Err(FetchError::Query(e)),
    };

    drop(client);
    let _ = driver.await;

    result
}

/// Convert a result row into JSON-safe values, keyed by column name.
fn row_to_map(row: &Row) -> Result<Map<String, Value>, FetchError> {
    let mut map = Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), column_to_json(row, idx)?);
    }
    Ok(map)
}

/// Decode one column into a JSON-safe value.
///
/// Column types are driver-dependent; each supported PostgreSQL type gets an
/// explicit conversion (bytea → base64, numeric → decimal string, temporal
/// types → RFC 3339 text). A type with no rule is a serialization error.
fn column_to_json(row: &Row, idx: usize) -> Result<Value, FetchError> {
    let col = &row.columns()[idx];
    let ty = col.type_();
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|n| Value::from(n as i64))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|n| Value::from(n as i64))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::from)),
        // Value::from(f64) yields JSON null for non-finite floats
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|n| Value::from(n as f64))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map(|v| v.map(Value::from)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(Value::String)),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map(|v| v.map(|bytes| Value::String(BASE64.encode(bytes)))),
        Type::NUMERIC => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)
            .map(|v| v.map(|d| Value::String(d.to_string()))),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map(|v| v.map(|u| Value::String(u.to_string()))),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map(|v| v.map(|t| Value::String(t.to_rfc3339()))),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map(|v| v.map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map(|v| v.map(|d| Value::String(d.to_string()))),
        Type::TIME => row
            .try_get::<_, Option<NaiveTime>>(idx)
            .map(|v| v.map(|t| Value::String(t.to_string()))),
        _ => {
            return Err(FetchError::Serialization(format!(
                "column '{}' has unsupported type {}",
                col.name(),
                ty
            )))
        },
    };

    let value = value.map_err(|e| {
        FetchError::Serialization(format!("column '{}' failed to decode: {}", col.name(), e))
    })?;
    Ok(value.unwrap_or(Value::Null))
}
