//! End-to-end runs of the sales pipeline against real files.

use lib::{PipelineConfig, RunSummary, Stage, run_pipeline};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(dir: &TempDir, input: &str) -> PipelineConfig {
    let input_path = dir.path().join("sales_data.csv");
    fs::write(&input_path, input).unwrap();
    PipelineConfig {
        input_path,
        store_path: dir.path().join("sales_data.db"),
        table_name: "sales".to_string(),
        ..PipelineConfig::default()
    }
}

fn table_rows(store: &Path) -> Vec<(String, i64, f64, f64)> {
    let conn = Connection::open(store).unwrap();
    let mut stmt = conn
        .prepare("SELECT date, quantity, unit_price, total_price FROM sales")
        .unwrap();
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();
    rows
}

#[test]
fn test_incomplete_row_dropped_and_total_loaded() {
    let dir = TempDir::new().unwrap();
    let config = config(
        &dir,
        "date,quantity,unit_price\n2023-01-01,2,5.0\n2023-01-02,,3.0\n",
    );

    let summary = run_pipeline(&config).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            rows_extracted: 2,
            rows_dropped: 1,
            rows_loaded: 1
        }
    );
    assert_eq!(
        table_rows(&config.store_path),
        vec![("2023-01-01 00:00:00".to_string(), 2, 5.0, 10.0)]
    );
}

#[test]
fn test_missing_input_never_touches_store() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        input_path: dir.path().join("absent.csv"),
        store_path: dir.path().join("sales_data.db"),
        ..PipelineConfig::default()
    };

    let err = run_pipeline(&config).unwrap_err();
    assert_eq!(err.stage(), Stage::Extract);
    assert!(!config.store_path.exists());
}

#[test]
fn test_missing_input_keeps_existing_table() {
    let dir = TempDir::new().unwrap();
    let good = config(&dir, "date,quantity,unit_price\n2023-01-01,3,1.5\n");
    run_pipeline(&good).unwrap();

    let missing = PipelineConfig {
        input_path: dir.path().join("absent.csv"),
        ..good.clone()
    };
    assert!(run_pipeline(&missing).is_err());
    assert_eq!(
        table_rows(&good.store_path),
        vec![("2023-01-01 00:00:00".to_string(), 3, 1.5, 4.5)]
    );
}

#[test]
fn test_non_numeric_quantity_halts_before_load() {
    let dir = TempDir::new().unwrap();
    let config = config(
        &dir,
        "date,quantity,unit_price\n2023-01-01,abc,5.0\n",
    );

    let err = run_pipeline(&config).unwrap_err();
    assert_eq!(err.stage(), Stage::Transform);
    assert!(!config.store_path.exists());
}

#[test]
fn test_second_run_replaces_first() {
    let dir = TempDir::new().unwrap();
    let first = config(
        &dir,
        "date,quantity,unit_price\n2023-01-01,1,1.0\n2023-01-02,2,2.0\n2023-01-03,3,3.0\n",
    );
    run_pipeline(&first).unwrap();

    let second = config(&dir, "date,quantity,unit_price\n2023-02-01,4,0.5\n");
    run_pipeline(&second).unwrap();

    assert_eq!(
        table_rows(&second.store_path),
        vec![("2023-02-01 00:00:00".to_string(), 4, 0.5, 2.0)]
    );
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = config(
        &dir,
        "date,quantity,unit_price\n2023-01-01,2,2.5\n2023-01-02,5,1.0\n",
    );
    run_pipeline(&config).unwrap();
    let first = table_rows(&config.store_path);
    run_pipeline(&config).unwrap();
    assert_eq!(table_rows(&config.store_path), first);
}

#[test]
fn test_extra_columns_pass_through() {
    let dir = TempDir::new().unwrap();
    let config = config(
        &dir,
        "region,date,quantity,unit_price,sku\nnorth,2023-03-01,2,4.25,A-1\n",
    );
    run_pipeline(&config).unwrap();

    let conn = Connection::open(&config.store_path).unwrap();
    let (region, sku, total): (String, String, f64) = conn
        .query_row("SELECT region, sku, total_price FROM sales", [], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })
        .unwrap();
    assert_eq!(region, "north");
    assert_eq!(sku, "A-1");
    assert_eq!(total, 8.5);
}

#[test]
fn test_invalid_table_name_reports_load_stage() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        table_name: String::new(),
        ..config(&dir, "date,quantity,unit_price\n2023-01-01,1,1.0\n")
    };
    let err = run_pipeline(&config).unwrap_err();
    assert_eq!(err.stage(), Stage::Load);
}

fn table_columns(store: &Path) -> Vec<(String, String)> {
    let conn = Connection::open(store).unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(sales)").unwrap();
    let columns = stmt
        .query_map([], |r| Ok((r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();
    columns
}

fn assert_empty_sales_table(store: &Path) {
    assert!(table_rows(store).is_empty());
    assert_eq!(
        table_columns(store),
        vec![
            ("date".to_string(), "TIMESTAMP".to_string()),
            ("quantity".to_string(), "REAL".to_string()),
            ("unit_price".to_string(), "REAL".to_string()),
            ("total_price".to_string(), "REAL".to_string()),
        ]
    );
}

#[test]
fn test_header_only_input_loads_empty_table() {
    let dir = TempDir::new().unwrap();
    let previous = config(&dir, "date,quantity,unit_price\n2023-01-01,2,5.0\n");
    run_pipeline(&previous).unwrap();

    let config = config(&dir, "date,quantity,unit_price\n");
    let summary = run_pipeline(&config).unwrap();
    assert_eq!(summary, RunSummary::default());
    assert_empty_sales_table(&config.store_path);
}

#[test]
fn test_all_rows_incomplete_loads_empty_table() {
    let dir = TempDir::new().unwrap();
    let previous = config(&dir, "date,quantity,unit_price\n2023-01-01,2,5.0\n");
    run_pipeline(&previous).unwrap();

    let config = config(
        &dir,
        "date,quantity,unit_price\n2023-01-01,,5.0\n2023-01-02,,3.0\n",
    );
    let summary = run_pipeline(&config).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            rows_extracted: 2,
            rows_dropped: 2,
            rows_loaded: 0
        }
    );
    assert_empty_sales_table(&config.store_path);
}
