use crate::error::ExtractionError;
use crate::structs::{CellValue, Column, ColumnType, Dataset};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, error};
use std::{collections::HashSet, fs::File, path::Path};

/// Cell contents read as missing values.
const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads a delimited text file with a header row into a [`Dataset`].
///
/// The whole file is held in memory. Each column's type is inferred once from
/// its non-missing cells: all integers gives `Integer`, all numbers gives
/// `Float`, anything else gives `Text`. Dates are left as text.
///
/// # Arguments
/// * `file_path` - Path to the delimited input file
/// * `delimiter` - Field separator byte (usually `b','`)
///
/// # Errors
/// Returns `ExtractionError` if the file cannot be opened, is not valid
/// delimited text, has no header, or has a row wider than the header. The
/// error is reported before it is returned.
pub fn extract_data(file_path: &Path, delimiter: u8) -> Result<Dataset, ExtractionError> {
    match read_dataset(file_path, delimiter) {
        Ok(dataset) => {
            println!("Data extraction complete.");
            Ok(dataset)
        }
        Err(e) => {
            error!("Error in extracting data: {}", e);
            Err(e)
        }
    }
}

fn read_dataset(file_path: &Path, delimiter: u8) -> Result<Dataset, ExtractionError> {
    debug!("Reading delimited file: {}", file_path.display());
    let file = File::open(file_path).map_err(|source| ExtractionError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let headers = dedupe_headers(reader.headers()?);
    if headers.is_empty() {
        return Err(ExtractionError::NoColumns);
    }

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(ExtractionError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|field| (!is_missing(field)).then(|| field.to_string()))
            .collect();
        // Short rows are padded with missing values
        row.resize(headers.len(), None);
        raw_rows.push(row);
    }

    let columns: Vec<Column> = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = infer_column_type(raw_rows.iter().filter_map(|row| row[i].as_deref()));
            Column::new(name, kind)
        })
        .collect();
    debug!(
        "Read {} rows | Schema: {}",
        raw_rows.len(),
        columns
            .iter()
            .map(|c| format!("{}={:?}", c.name, c.kind))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&columns)
                .map(|(raw, column)| to_cell(raw, column.kind))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}

fn is_missing(field: &str) -> bool {
    NA_VALUES.contains(&field)
}

/// Repeated header names become `name.1`, `name.2`, ...
fn dedupe_headers(headers: &StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let mut name = header.to_string();
            let mut suffix = 0;
            while seen.contains(&name) {
                suffix += 1;
                name = format!("{}.{}", header, suffix);
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

/// Narrowest type that holds every present value; an all-missing column is text.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut kind = None;
    for value in values {
        let trimmed = value.trim();
        let cell_kind = if trimmed.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if trimmed.parse::<f64>().is_ok() {
            ColumnType::Float
        } else {
            return ColumnType::Text;
        };
        kind = Some(match (kind, cell_kind) {
            (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
            _ => ColumnType::Integer,
        });
    }
    kind.unwrap_or(ColumnType::Text)
}

fn to_cell(raw: Option<String>, kind: ColumnType) -> CellValue {
    let Some(text) = raw else {
        return CellValue::Null;
    };
    match kind {
        ColumnType::Integer => match text.trim().parse::<i64>() {
            Ok(n) => CellValue::Integer(n),
            Err(_) => CellValue::Text(text),
        },
        ColumnType::Float => match text.trim().parse::<f64>() {
            Ok(x) => CellValue::Float(x),
            Err(_) => CellValue::Text(text),
        },
        ColumnType::Text | ColumnType::DateTime => CellValue::Text(text),
    }
}
