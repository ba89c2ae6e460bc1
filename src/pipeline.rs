use crate::error::Result;
use crate::extract::extract_data;
use crate::load::load_data;
use crate::structs::{PipelineConfig, RunSummary};
use crate::transform::transform_data;
use log::debug;
use std::time::Instant;

/// Runs extract, transform and load in order.
///
/// Stops at the first stage that fails; later stages are never started, so a
/// failed extraction or transformation leaves the store untouched.
///
/// # Errors
/// Returns `PipelineError` tagged with the failing stage.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    debug!("Extracting {}", config.input_path.display());
    let extract_start = Instant::now();
    let dataset = extract_data(&config.input_path, config.delimiter)?;
    let rows_extracted = dataset.row_count();
    println!(
        "Extraction took {:.2?} | Read {} rows",
        extract_start.elapsed(),
        rows_extracted
    );

    let transform_start = Instant::now();
    let dataset = transform_data(dataset)?;
    let rows_dropped = rows_extracted - dataset.row_count();
    println!(
        "Transformation took {:.2?} | Dropped {} incomplete rows",
        transform_start.elapsed(),
        rows_dropped
    );

    debug!(
        "Loading into {} (table {})",
        config.store_path.display(),
        config.table_name
    );
    let load_start = Instant::now();
    let rows_loaded = load_data(&dataset, &config.store_path, &config.table_name)?;
    println!(
        "Load took {:.2?} | Wrote {} rows",
        load_start.elapsed(),
        rows_loaded
    );

    if let Some(first) = dataset.rows.first() {
        debug!("Sample: {}", serde_json::to_string(first).unwrap_or_default());
    }

    Ok(RunSummary {
        rows_extracted,
        rows_dropped,
        rows_loaded,
    })
}
