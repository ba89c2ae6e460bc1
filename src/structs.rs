use chrono::NaiveDateTime;
use log::{Log, Metadata, Record as LogRecord};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_INPUT_PATH: &str = "sales_data.csv";
pub const DEFAULT_STORE_PATH: &str = "sales_data.db";
pub const DEFAULT_TABLE_NAME: &str = "sales";

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// A single typed cell of a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Column type, inferred once when the file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    DateTime,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// In-memory table: ordered rows, each positionally aligned with `columns`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at `row` in the column called `name`, if both exist.
    pub fn value(&self, row: usize, name: &str) -> Option<&CellValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn has_missing_values(&self) -> bool {
        self.rows.iter().flatten().any(CellValue::is_null)
    }
}

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub store_path: PathBuf,
    pub table_name: String,
    pub delimiter: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            delimiter: b',',
        }
    }
}

/// Row counts reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rows_extracted: usize,
    pub rows_dropped: usize,
    pub rows_loaded: usize,
}
