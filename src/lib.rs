pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod structs;
pub mod transform;

// Re-export public API
pub use error::{ExtractionError, LoadError, PipelineError, Result, Stage, TransformationError};
pub use extract::extract_data;
pub use load::load_data;
pub use pipeline::run_pipeline;
pub use structs::{
    CellValue, Column, ColumnType, Dataset, PipelineConfig, RunSummary, SimpleLogger,
};
pub use transform::transform_data;
