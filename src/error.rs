use std::path::PathBuf;

/// Failures while reading the delimited input file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("I/O Error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("No columns to parse from file")]
    NoColumns,
    #[error("Expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// Failures while cleaning and enriching a dataset.
#[derive(Debug, thiserror::Error)]
pub enum TransformationError {
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Column {column} is not numeric (row {row})")]
    NonNumeric { column: String, row: usize },
    #[error("Unable to parse date '{value}' (row {row})")]
    InvalidDate { row: usize, value: String },
    #[error("Integer overflow computing total_price (row {row})")]
    Overflow { row: usize },
}

/// Failures while writing to the relational store.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("SQLite Error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),
}

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Error in extracting data: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Error in transforming data: {0}")]
    Transformation(#[from] TransformationError),
    #[error("Error in loading data to the database: {0}")]
    Load(#[from] LoadError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Extraction(_) => Stage::Extract,
            PipelineError::Transformation(_) => Stage::Transform,
            PipelineError::Load(_) => Stage::Load,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
