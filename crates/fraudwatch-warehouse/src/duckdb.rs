//! `DuckDB` connector and query execution.

use std::path::{Path, PathBuf};

use ::duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DuckValue};
use ::duckdb::{params_from_iter, AccessMode as DuckAccessMode, Config, Connection};
use serde_json::{Number, Value};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::trace;

use crate::connection::{Connector, WarehouseConnection};
use crate::error::WarehouseError;
use crate::query::{Query, SqlParam};
use crate::tabular::{number_from_f64, Column, TabularResult};

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// Access mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only access.
    ReadOnly,
    /// Read-write access.
    ReadWrite,
}

/// Opens `DuckDB` connections to a warehouse file.
#[derive(Debug, Clone)]
pub struct DuckDbConnector {
    db_path: PathBuf,
    mode: AccessMode,
}

impl DuckDbConnector {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, mode: AccessMode) -> Self {
        Self {
            db_path: path.into(),
            mode,
        }
    }
}

impl Connector for DuckDbConnector {
    type Connection = DuckDbConnection;

    fn connect(&self) -> Result<Self::Connection, WarehouseError> {
        let connection =
            open_connection(self.db_path.as_path(), self.mode).map_err(WarehouseError::connection)?;
        Ok(DuckDbConnection { connection })
    }
}

/// A single `DuckDB` connection.
pub struct DuckDbConnection {
    connection: Connection,
}

impl WarehouseConnection for DuckDbConnection {
    fn probe(&self) -> Result<(), WarehouseError> {
        self.connection
            .query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        Ok(())
    }

    fn query(&self, query: &Query, max_rows: usize) -> Result<TabularResult, WarehouseError> {
        let sql = query.read_only_sql()?;
        execute_select_query(&self.connection, sql, query.params(), max_rows)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> ::duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Text(value) => DuckValue::Text(value.clone()),
            Self::Integer(value) => DuckValue::BigInt(*value),
            Self::Real(value) => DuckValue::Double(*value),
            Self::Bool(value) => DuckValue::Boolean(*value),
            Self::Date(value) => DuckValue::Text(value.to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Open a new database connection.
///
/// # Errors
/// Returns an error if the database file cannot be opened or configured.
fn open_connection(path: &Path, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
    let connection = match mode {
        AccessMode::ReadOnly => {
            let config = Config::default().access_mode(DuckAccessMode::ReadOnly)?;
            Connection::open_with_flags(path, config)?
        }
        AccessMode::ReadWrite => Connection::open(path)?,
    };
    configure_connection(&connection)?;
    Ok(connection)
}

/// Configure a database connection with appropriate settings.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}

/// Execute a SELECT query and collect results.
fn execute_select_query(
    connection: &Connection,
    sql: &str,
    params: &[SqlParam],
    max_rows: usize,
) -> Result<TabularResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    // Column metadata is only available once the statement has run.
    let _ = statement.query(params_from_iter(params.iter()))?;

    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement.column_name(index)?.to_string();
        let dtype = statement.column_type(index);
        columns.push(Column::new(name, dtype.to_string()));
    }

    let mut rows_cursor = statement.query(params_from_iter(params.iter()))?;
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows_cursor.next()? {
        if rows.len() >= max_rows {
            truncated = true;
            break;
        }
        rows.push(read_row(row, column_count)?);
    }

    trace!(columns = column_count, rows = rows.len(), truncated, "query materialized");
    Ok(TabularResult {
        columns,
        rows,
        truncated,
    })
}

/// Read a single row from the result set.
fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

/// Convert a DuckDB value to a JSON value.
fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::HugeInt(value) => i64::try_from(value)
            .map(|value| Value::Number(Number::from(value)))
            .unwrap_or_else(|_| Value::String(value.to_string())),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Decimal(value) => value
            .to_string()
            .parse::<f64>()
            .map(number_from_f64)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        DuckValue::Date32(days) => date_from_days(days)
            .map(|date| Value::String(date.to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, value) => timestamp_to_iso8601(unit, value)
            .map(Value::String)
            .unwrap_or(Value::Null),
        other => Value::String(format!("{other:?}")),
    }
}

fn date_from_days(days: i32) -> Option<Date> {
    Date::from_julian_day(UNIX_EPOCH_JULIAN_DAY.checked_add(days)?).ok()
}

/// Render a timestamp as local wall-clock time, without an offset.
fn timestamp_to_iso8601(unit: TimeUnit, value: i64) -> Option<String> {
    let nanos_per_unit: i128 = match unit {
        TimeUnit::Second => 1_000_000_000,
        TimeUnit::Millisecond => 1_000_000,
        TimeUnit::Microsecond => 1_000,
        TimeUnit::Nanosecond => 1,
    };
    let instant =
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(value) * nanos_per_unit).ok()?;
    let format = if instant.nanosecond() == 0 {
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")
    } else {
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]")
    };
    instant.format(format).ok()
}
