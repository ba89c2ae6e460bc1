use crate::error::TransformationError;
use crate::structs::{CellValue, Column, ColumnType, Dataset};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, error};

pub const DATE_COLUMN: &str = "date";
pub const QUANTITY_COLUMN: &str = "quantity";
pub const UNIT_PRICE_COLUMN: &str = "unit_price";
pub const TOTAL_PRICE_COLUMN: &str = "total_price";

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Cleans a sales dataset and derives its `total_price` column.
///
/// Steps, in order:
/// 1. Drops every row with a missing value in any column.
/// 2. Parses the `date` column into date/time values.
/// 3. Adds `total_price = quantity * unit_price`.
///
/// Row order after filtering is preserved.
///
/// # Arguments
///
/// * `dataset` - Dataset produced by the extractor; consumed and returned
///
/// # Errors
///
/// Returns `TransformationError` if:
/// - `date`, `quantity` or `unit_price` is absent
/// - a date value cannot be parsed
/// - `quantity` or `unit_price` is not numeric
/// - an integer product overflows
///
/// The error is reported before it is returned.
pub fn transform_data(dataset: Dataset) -> Result<Dataset, TransformationError> {
    match apply_transform(dataset) {
        Ok(dataset) => {
            println!("Data transformation complete.");
            Ok(dataset)
        }
        Err(e) => {
            error!("Error in transforming data: {}", e);
            Err(e)
        }
    }
}

fn apply_transform(mut dataset: Dataset) -> Result<Dataset, TransformationError> {
    let dropped = drop_incomplete_rows(&mut dataset);
    debug!(
        "Dropped {} incomplete rows, {} remain",
        dropped,
        dataset.row_count()
    );
    normalize_dates(&mut dataset)?;
    add_total_price(&mut dataset)?;
    debug!("Transform processing completed successfully");
    Ok(dataset)
}

/// Removes rows containing any missing value. Returns how many were removed.
pub fn drop_incomplete_rows(dataset: &mut Dataset) -> usize {
    let before = dataset.row_count();
    dataset
        .rows
        .retain(|row| !row.iter().any(CellValue::is_null));
    before - dataset.row_count()
}

/// Converts every `date` cell to a date/time and retypes the column.
///
/// Cells that already hold a date/time are kept as they are.
pub fn normalize_dates(dataset: &mut Dataset) -> Result<(), TransformationError> {
    let idx = get_column_index(dataset, DATE_COLUMN)?;

    for (row, cells) in dataset.rows.iter_mut().enumerate() {
        let parsed = match &cells[idx] {
            CellValue::DateTime(dt) => *dt,
            CellValue::Text(s) => parse_datetime(s).ok_or_else(|| invalid_date(row, s))?,
            CellValue::Integer(n) => {
                let s = n.to_string();
                parse_datetime(&s).ok_or_else(|| invalid_date(row, &s))?
            }
            other => return Err(invalid_date(row, &format!("{:?}", other))),
        };
        cells[idx] = CellValue::DateTime(parsed);
    }

    dataset.columns[idx].kind = ColumnType::DateTime;
    Ok(())
}

/// Sets `total_price` to `quantity * unit_price` for every row.
///
/// Integer operands give an integer product; any float operand gives a float.
/// An existing `total_price` column is overwritten in place, otherwise the
/// column is appended.
pub fn add_total_price(dataset: &mut Dataset) -> Result<(), TransformationError> {
    let quantity_idx = get_numeric_column_index(dataset, QUANTITY_COLUMN)?;
    let price_idx = get_numeric_column_index(dataset, UNIT_PRICE_COLUMN)?;

    let totals = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| multiply(&cells[quantity_idx], &cells[price_idx], row))
        .collect::<Result<Vec<_>, _>>()?;

    let kind = if dataset.columns[quantity_idx].kind == ColumnType::Integer
        && dataset.columns[price_idx].kind == ColumnType::Integer
    {
        ColumnType::Integer
    } else {
        ColumnType::Float
    };

    match dataset.column_index(TOTAL_PRICE_COLUMN) {
        Some(idx) => {
            dataset.columns[idx].kind = kind;
            for (cells, total) in dataset.rows.iter_mut().zip(totals) {
                cells[idx] = total;
            }
        }
        None => {
            dataset.columns.push(Column::new(TOTAL_PRICE_COLUMN, kind));
            for (cells, total) in dataset.rows.iter_mut().zip(totals) {
                cells.push(total);
            }
        }
    }
    Ok(())
}

/// Parses a date or date/time string. Date-only values land on midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn multiply(
    quantity: &CellValue,
    unit_price: &CellValue,
    row: usize,
) -> Result<CellValue, TransformationError> {
    match (quantity, unit_price) {
        (CellValue::Integer(q), CellValue::Integer(p)) => q
            .checked_mul(*p)
            .map(CellValue::Integer)
            .ok_or(TransformationError::Overflow { row }),
        (CellValue::Integer(q), CellValue::Float(p)) => Ok(CellValue::Float(*q as f64 * p)),
        (CellValue::Float(q), CellValue::Integer(p)) => Ok(CellValue::Float(q * *p as f64)),
        (CellValue::Float(q), CellValue::Float(p)) => Ok(CellValue::Float(q * p)),
        (CellValue::Integer(_) | CellValue::Float(_), _) => Err(non_numeric(UNIT_PRICE_COLUMN, row)),
        _ => Err(non_numeric(QUANTITY_COLUMN, row)),
    }
}

fn get_column_index(dataset: &Dataset, name: &str) -> Result<usize, TransformationError> {
    dataset
        .column_index(name)
        .ok_or_else(|| TransformationError::MissingColumn(name.to_string()))
}

/// Like [`get_column_index`], but rejects columns holding a non-numeric cell.
///
/// A text column left with no rows after filtering is retyped as `Float`.
fn get_numeric_column_index(
    dataset: &mut Dataset,
    name: &str,
) -> Result<usize, TransformationError> {
    let idx = get_column_index(dataset, name)?;
    if let Some(row) = dataset
        .rows
        .iter()
        .position(|cells| !matches!(cells[idx], CellValue::Integer(_) | CellValue::Float(_)))
    {
        return Err(non_numeric(name, row));
    }
    if !dataset.columns[idx].kind.is_numeric() {
        dataset.columns[idx].kind = ColumnType::Float;
    }
    Ok(idx)
}

fn non_numeric(column: &str, row: usize) -> TransformationError {
    TransformationError::NonNumeric {
        column: column.to_string(),
        row,
    }
}

fn invalid_date(row: usize, value: &str) -> TransformationError {
    TransformationError::InvalidDate {
        row,
        value: value.to_string(),
    }
}
