//! PostgreSQL backend over `tokio-postgres`.
//!
//! Statements are sent as plain SQL text with no parameters; typed result
//! columns are converted into [`Value`]s.

use super::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::format::SqlFormat;
use crate::row::Row;
use crate::table::SQL_TARGET;
use crate::value::Value;
use tokio_postgres::types::Type;

/// Connect with `NoTls` and drive the connection on a spawned task.
pub async fn connect(database_url: &str) -> OrmResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, tokio_postgres::NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: SQL_TARGET, error = %e, "postgres connection error");
        }
    });
    Ok(client)
}

/// Convert a `tokio-postgres` row into a [`Row`].
///
/// Supported column types are the integer, float, numeric, boolean, text,
/// bytea, date and timestamp families plus JSON (as text). Anything else is a
/// decode error.
pub fn convert_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.name(), column.type_())?;
        out.set(column.name(), value);
    }
    Ok(out)
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    name: &str,
    ty: &Type,
) -> OrmResult<Value> {
    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map_err(|e| OrmError::decode(name, e.to_string()))?
        };
    }

    let value = match *ty {
        Type::BOOL => Value::from(get!(bool)),
        Type::INT2 => Value::from(get!(i16)),
        Type::INT4 => Value::from(get!(i32)),
        Type::INT8 => Value::from(get!(i64)),
        Type::OID => Value::from(get!(u32)),
        Type::FLOAT4 => Value::from(get!(f32)),
        Type::FLOAT8 => Value::from(get!(f64)),
        Type::NUMERIC => Value::from(get!(rust_decimal::Decimal)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            Value::from(get!(String))
        }
        Type::TIMESTAMP => Value::from(get!(chrono::NaiveDateTime)),
        Type::BYTEA => Value::from(get!(Vec<u8>)),
        Type::TIMESTAMPTZ => {
            Value::from(get!(chrono::DateTime<chrono::Utc>).map(|dt| dt.naive_utc()))
        }
        Type::DATE => Value::from(get!(chrono::NaiveDate)),
        Type::JSON | Type::JSONB => Value::from(get!(serde_json::Value).map(|v| v.to_string())),
        _ => {
            return Err(OrmError::decode(
                name,
                format!("unsupported column type {ty}"),
            ));
        }
    };
    Ok(value)
}

fn convert_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    rows.iter().map(convert_row).collect()
}

impl SqlFormat for tokio_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

impl Database for tokio_postgres::Client {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &[]).await?)
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        convert_rows(tokio_postgres::Client::query(self, sql, &[]).await?)
    }
}

impl SqlFormat for tokio_postgres::Transaction<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

impl Database for tokio_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, &[]).await?)
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        convert_rows(tokio_postgres::Transaction::query(self, sql, &[]).await?)
    }
}
