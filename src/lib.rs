//! xlsxmerge - Pure-Rust incremental Excel merge engine for recurring database exports
//!
//! This crate merges batches of records (fetched from an external query on a
//! sliding date window) into a persistent XLSX workbook that doubles as a
//! styled report and as a data source for downstream BI tools. Each run
//! appends only the rows that are not already present, keeps the manual
//! formatting of the workbook intact, and resizes the registered table
//! region to the new data extent.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxmerge::{AbsentPolicy, KeySelector, MergerBuilder, RecordBatch};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Configure a merger: dedupe on the first column, update table "Portes"
//!     let merger = MergerBuilder::new()
//!         .with_absent_policy(AbsentPolicy::Bootstrap)
//!         .with_key_selector(KeySelector::Column(1))
//!         .with_table_name("Portes")
//!         .build()?;
//!
//!     // A batch fetched from the external source (JSON interchange format)
//!     let json = std::fs::read_to_string("batch.json")?;
//!     let batch: RecordBatch = serde_json::from_str(&json)?;
//!
//!     // Merge into the workbook; only novel keys are appended
//!     let report = merger.run("Portes.xlsx", &batch)?;
//!     println!("appended {} of {} records", report.appended, report.fetched);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Fetching from a source
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use xlsxmerge::{
//!     AbsentPolicy, DateWindow, MergerBuilder, RecordBatch, RecordSource, XlsxMergeError,
//! };
//!
//! struct MySource;
//!
//! impl RecordSource for MySource {
//!     fn fetch(&mut self, window: &DateWindow) -> Result<RecordBatch, XlsxMergeError> {
//!         let (start, end) = window.iso_bounds();
//!         // ... run the query between `start` and `end` ...
//!         # let _ = (start, end);
//!         Err(XlsxMergeError::SourceUnavailable("not implemented".to_string()))
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let merger = MergerBuilder::new()
//!     .with_absent_policy(AbsentPolicy::Abort)
//!     .build()?;
//!
//! // Two months back, truncated to the first day of the month
//! let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
//! let window = DateWindow::trailing_months(today, 2);
//!
//! let report = merger.run_with_source("Portes.xlsx", &mut MySource, &window)?;
//! println!("{:?}", report.table);
//! # Ok(())
//! # }
//! ```
//!
//! # Guarantees
//!
//! - Re-running the same batch is idempotent: the second run appends nothing.
//! - No two data rows share the same non-null dedupe key after a merge.
//! - The header row is never modified; existing rows keep their order; new
//!   rows are appended in arrival order.
//! - The workbook file is replaced atomically on save, or not at all.

mod api;
mod builder;
mod error;
mod merge;
mod sheet;
mod source;
mod style;
mod table;
mod types;
mod workbook;

// 公開API
pub use api::{
    AbsentPolicy, KeySelector, MergeReport, RunStatus, TableOutcome, TableStylePreset,
};
pub use builder::{Merger, MergerBuilder};
pub use error::XlsxMergeError;
pub use merge::MergeStats;
pub use sheet::{Row, Sheet};
pub use source::{DateWindow, RecordBatch, RecordSource};
pub use style::{AlignStyle, BorderStyle, CellStyle, FillStyle, FontStyle};
pub use table::TableRegion;
pub use types::{column_index, column_letter, CellCoord, CellRange, CellValue};
