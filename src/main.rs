use clap::Parser;
use lib::structs::{DEFAULT_INPUT_PATH, DEFAULT_STORE_PATH, DEFAULT_TABLE_NAME};
use lib::{PipelineConfig, SimpleLogger, run_pipeline};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input delimited file with a header row
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input_file: PathBuf,

    /// SQLite database file (created if absent)
    #[arg(short, long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Table to replace with the transformed rows
    #[arg(short, long, default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// Single-byte field delimiter
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    debug: bool,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        Self {
            input_path: args.input_file,
            store_path: args.store,
            table_name: args.table,
            delimiter: args.delimiter,
        }
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got '{}'", value)),
    }
}

fn main() -> ExitCode {
    let total_start = Instant::now();
    let args = Args::parse();
    if log::set_logger(&LOGGER).is_ok() {
        if args.debug {
            log::set_max_level(log::LevelFilter::Debug);
        } else {
            log::set_max_level(log::LevelFilter::Info);
        }
    }

    println!("SalesLoader! CSV to SQLite Sales Pipeline");
    let config = PipelineConfig::from(args);
    debug!(
        "Pipeline config: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    // Each stage reports its own failure
    match run_pipeline(&config) {
        Ok(summary) => {
            println!(
                "\nLoaded {} of {} records into '{}' ({})",
                summary.rows_loaded,
                summary.rows_extracted,
                config.table_name,
                config.store_path.display()
            );
            println!("Pipeline completed successfully in {:.2?}", total_start.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("Pipeline halted at {:?} stage", e.stage());
            ExitCode::FAILURE
        }
    }
}
