//! Merge Tool Example
//!
//! This example demonstrates how to wire xlsxmerge into a scheduled job:
//! configuration comes from environment variables at the process boundary,
//! the record batch comes from a JSON file (the stand-in for an external
//! query result), and the run report is printed to the console.
//!
//! Environment variables:
//!   EXCEL_FILE_PATH   target workbook path      (default: Portes.xlsx)
//!   TABLE_NAME        table region to resize    (default: MiTabla)
//!   CREATE_TABLE      1 to create when missing  (default: 0)
//!   ABSENT_POLICY     abort | bootstrap         (default: abort)
//!   KEY_COLUMN        1-based dedupe key column (default: 1)
//!   WINDOW_MONTHS     months back for the window (default: 2)

use std::path::PathBuf;
use std::process;

use xlsxmerge::{
    AbsentPolicy, DateWindow, KeySelector, MergeReport, MergerBuilder, RecordBatch, RecordSource,
    RunStatus, TableOutcome, XlsxMergeError,
};

/// Record source backed by a JSON batch file.
///
/// In production this would be a database adapter interpolating the window
/// bounds into a query; here the file plays that role.
struct JsonFileSource {
    path: PathBuf,
}

impl RecordSource for JsonFileSource {
    fn fetch(&mut self, window: &DateWindow) -> Result<RecordBatch, XlsxMergeError> {
        let (start, end) = window.iso_bounds();
        eprintln!("fetching batch {} ({} .. {})", self.path.display(), start, end);

        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            XlsxMergeError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            XlsxMergeError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <batch.json>", args[0]);
        eprintln!("\nThe batch file holds the fetched records as JSON:");
        eprintln!("  {{\"header\": [\"ID FACTURA\", ...], \"rows\": [[{{\"Number\": 101.0}}, ...], ...]}}");
        eprintln!("\nConfiguration is taken from environment variables:");
        eprintln!("  EXCEL_FILE_PATH, TABLE_NAME, CREATE_TABLE, ABSENT_POLICY,");
        eprintln!("  KEY_COLUMN, WINDOW_MONTHS");
        process::exit(1);
    }

    let batch_path = PathBuf::from(&args[1]);
    let file_path = env_or("EXCEL_FILE_PATH", "Portes.xlsx");

    match run(batch_path, &file_path) {
        Ok(report) => print_report(&report, &file_path),
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn run(batch_path: PathBuf, file_path: &str) -> Result<MergeReport, XlsxMergeError> {
    // Explicit configuration, resolved once at the process boundary
    let policy = match env_or("ABSENT_POLICY", "abort").to_lowercase().as_str() {
        "bootstrap" => AbsentPolicy::Bootstrap,
        "abort" => AbsentPolicy::Abort,
        other => {
            return Err(XlsxMergeError::Config(format!(
                "ABSENT_POLICY must be 'abort' or 'bootstrap', got '{}'",
                other
            )));
        }
    };
    let key_column: u32 = env_or("KEY_COLUMN", "1")
        .parse()
        .map_err(|_| XlsxMergeError::Config("KEY_COLUMN must be a column number".to_string()))?;
    let window_months: u32 = env_or("WINDOW_MONTHS", "2")
        .parse()
        .map_err(|_| XlsxMergeError::Config("WINDOW_MONTHS must be a number".to_string()))?;

    let merger = MergerBuilder::new()
        .with_absent_policy(policy)
        .with_key_selector(KeySelector::Column(key_column))
        .with_table_name(env_or("TABLE_NAME", "MiTabla"))
        .create_table_if_missing(env_or("CREATE_TABLE", "0") == "1")
        .build()?;

    let today = chrono::Local::now().date_naive();
    let window = DateWindow::trailing_months(today, window_months);

    let mut source = JsonFileSource { path: batch_path };
    merger.run_with_source(file_path, &mut source, &window)
}

fn print_report(report: &MergeReport, file_path: &str) {
    if report.status == RunStatus::NoResults {
        println!("No records fetched; {} left untouched.", file_path);
        return;
    }

    if report.bootstrapped {
        println!("Base file not found; created a fresh sheet.");
    }
    println!(
        "Fetched {} records: {} appended, {} already present, {} duplicated in batch.",
        report.fetched, report.appended, report.skipped_existing, report.skipped_within_batch
    );
    match &report.table {
        TableOutcome::Updated(range) => println!("Table region updated to {}.", range),
        TableOutcome::Created(range) => println!("Table region created over {}.", range),
        TableOutcome::Missing => {
            println!("Table region not found; formatting kept, boundary not updated.")
        }
        _ => {}
    }
    println!("Saved {}.", file_path);
}

fn handle_error(error: XlsxMergeError) {
    match error {
        XlsxMergeError::SourceUnavailable(msg) => {
            eprintln!("Source Error: {}", msg);
            eprintln!("Nothing was written; re-run once the source is reachable.");
        }
        XlsxMergeError::ContainerAbsent { path } => {
            eprintln!("Container Missing: {}", path.display());
            eprintln!("Set ABSENT_POLICY=bootstrap to create a fresh sheet instead.");
        }
        XlsxMergeError::SchemaMismatch(msg) => {
            eprintln!("Schema Mismatch: {}", msg);
            eprintln!("The batch columns must match the existing sheet positionally.");
        }
        XlsxMergeError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        XlsxMergeError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        XlsxMergeError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The workbook may not be a valid XLSX file or may be corrupted.");
        }
        XlsxMergeError::Write(write_err) => {
            eprintln!("Write Error: {}", write_err);
        }
        XlsxMergeError::Zip(msg) => {
            eprintln!("ZIP Archive Error: {}", msg);
        }
        XlsxMergeError::Utf8(utf8_err) => {
            eprintln!("UTF-8 Conversion Error: {}", utf8_err);
        }
        XlsxMergeError::ParseInt(parse_int_err) => {
            eprintln!("Number Parse Error: {}", parse_int_err);
        }
        XlsxMergeError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
            eprintln!("The container violates size or structure constraints.");
        }
    }
}
