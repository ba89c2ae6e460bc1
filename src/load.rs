use crate::error::LoadError;
use crate::structs::{CellValue, ColumnType, Dataset};
use chrono::{NaiveDateTime, Timelike};
use log::{debug, error};
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::path::Path;

/// Writes a dataset into an SQLite table, replacing any existing table of that name.
///
/// The store file is created if absent. Dropping the old table, creating the
/// new one and inserting every row happen in one transaction; the connection
/// is closed when this function returns, on success or failure.
///
/// # Arguments
/// * `dataset` - Transformed dataset; not re-validated
/// * `store_path` - Path of the SQLite database file
/// * `table_name` - Target table name
///
/// # Returns
/// Returns the number of rows written.
///
/// # Errors
/// Returns `LoadError` if the table name is empty or if opening, writing or
/// committing fails. The error is reported before it is returned.
pub fn load_data(
    dataset: &Dataset,
    store_path: &Path,
    table_name: &str,
) -> Result<usize, LoadError> {
    match write_table(dataset, store_path, table_name) {
        Ok(rows) => {
            println!("Data loaded successfully into the database.");
            Ok(rows)
        }
        Err(e) => {
            error!("Error in loading data to the database: {}", e);
            Err(e)
        }
    }
}

fn write_table(dataset: &Dataset, store_path: &Path, table_name: &str) -> Result<usize, LoadError> {
    if table_name.trim().is_empty() {
        return Err(LoadError::InvalidTableName(table_name.to_string()));
    }

    debug!("Opening SQLite store: {}", store_path.display());
    let mut conn = Connection::open(store_path)?;
    let tx = conn.transaction()?;

    let table = quote_identifier(table_name);
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    tx.execute(&create_table_sql(dataset, &table), [])?;

    {
        let placeholders = vec!["?"; dataset.column_count()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            table, placeholders
        ))?;
        for row in &dataset.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }

    tx.commit()?;
    debug!(
        "Wrote {} rows to table {} in {}",
        dataset.row_count(),
        table_name,
        store_path.display()
    );
    Ok(dataset.row_count())
}

fn create_table_sql(dataset: &Dataset, quoted_table: &str) -> String {
    let columns = dataset
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), sql_type(c.kind)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quoted_table, columns)
}

fn sql_type(kind: ColumnType) -> &'static str {
    match kind {
        ColumnType::Text => "TEXT",
        ColumnType::Integer => "INTEGER",
        ColumnType::Float => "REAL",
        ColumnType::DateTime => "TIMESTAMP",
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Text form stored for date/time cells; sub-seconds only when present.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Text(s) => ToSqlOutput::from(s.as_str()),
            CellValue::Integer(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            CellValue::Float(x) => ToSqlOutput::Owned(Value::Real(*x)),
            CellValue::DateTime(dt) => ToSqlOutput::Owned(Value::Text(format_datetime(dt))),
        })
    }
}
