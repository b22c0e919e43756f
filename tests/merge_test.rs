//! Integration Tests for the merge pipeline
//!
//! End-to-end tests that run the merger against real XLSX containers on disk.
//! Fixtures are generated with rust_xlsxwriter; results are verified through
//! calamine (cell values) and direct XML inspection (style ids, table refs).

use xlsxmerge::{AbsentPolicy, KeySelector, MergerBuilder, RunStatus, TableOutcome};

/// Shared column layout for all fixtures (mirrors an invoice export query).
const HEADER: [&str; 6] = [
    "ID FACTURA",
    "FECHA FACTURA",
    "CÓDIGO FACTURA",
    "CLIENTE",
    "CIUDAD",
    "PORTES",
];

// Helper module for generating test fixtures
mod fixtures {
    use super::HEADER;
    use rust_xlsxwriter::{Color, Format, Table, TableColumn, TableStyle, Workbook};
    use std::path::Path;
    use xlsxmerge::{CellValue, RecordBatch};

    /// Generate a base container: bold header, `data_rows` rows with ids
    /// 101, 102, ..., a solid fill on the last data row, and optionally a
    /// "Portes" table over the full extent.
    pub fn write_base_container(path: &Path, data_rows: u32, with_table: bool) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Resultados").unwrap();

        let bold = Format::new().set_bold();
        for (col, label) in HEADER.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *label, &bold)
                .unwrap();
        }

        let filled = Format::new().set_background_color(Color::RGB(0xDDEBF7));
        for i in 0..data_rows {
            let row = i + 1;
            let id = 101.0 + f64::from(i);
            let styled = i == data_rows - 1;
            let fmt = if styled { Some(&filled) } else { None };

            write_cell(worksheet, row, 0, &CellValue::Number(id), fmt);
            write_cell(
                worksheet,
                row,
                1,
                &CellValue::String("2026-06-15".to_string()),
                fmt,
            );
            write_cell(
                worksheet,
                row,
                2,
                &CellValue::String(format!("F-{}", id as u32)),
                fmt,
            );
            write_cell(
                worksheet,
                row,
                3,
                &CellValue::String("BBSeeds".to_string()),
                fmt,
            );
            write_cell(
                worksheet,
                row,
                4,
                &CellValue::String("Madrid".to_string()),
                fmt,
            );
            write_cell(worksheet, row, 5, &CellValue::Number(12.5), fmt);
        }

        if with_table && data_rows > 0 {
            let columns: Vec<TableColumn> = HEADER
                .iter()
                .map(|label| TableColumn::new().set_header(*label))
                .collect();
            let table = Table::new()
                .set_name("Portes")
                .set_style(TableStyle::Medium9)
                .set_columns(&columns);
            worksheet.add_table(0, 0, data_rows, 5, &table).unwrap();
        }

        workbook.save(path).unwrap();
    }

    fn write_cell(
        worksheet: &mut rust_xlsxwriter::Worksheet,
        row: u32,
        col: u16,
        value: &CellValue,
        format: Option<&Format>,
    ) {
        match (value, format) {
            (CellValue::Number(n), Some(f)) => {
                worksheet.write_number_with_format(row, col, *n, f).unwrap();
            }
            (CellValue::Number(n), None) => {
                worksheet.write_number(row, col, *n).unwrap();
            }
            (CellValue::String(s), Some(f)) => {
                worksheet
                    .write_string_with_format(row, col, s.as_str(), f)
                    .unwrap();
            }
            (CellValue::String(s), None) => {
                worksheet.write_string(row, col, s.as_str()).unwrap();
            }
            _ => unreachable!("fixtures only use numbers and strings"),
        }
    }

    /// One incoming record with the fixture column layout.
    pub fn record(id: Option<f64>, client: &str) -> Vec<CellValue> {
        vec![
            match id {
                Some(n) => CellValue::Number(n),
                None => CellValue::Empty,
            },
            CellValue::String("2026-07-01".to_string()),
            CellValue::String(
                id.map(|n| format!("F-{}", n as u32))
                    .unwrap_or_else(|| "F-???".to_string()),
            ),
            CellValue::String(client.to_string()),
            CellValue::String("Valencia".to_string()),
            CellValue::Number(8.0),
        ]
    }

    pub fn batch(rows: Vec<Vec<CellValue>>) -> RecordBatch {
        RecordBatch::new(HEADER.iter().map(|s| s.to_string()).collect(), rows)
    }
}

// Helper module for inspecting saved containers
mod inspect {
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;
    use zip::ZipArchive;

    /// Read all cell values of the first sheet as display strings.
    pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
        use calamine::{open_workbook, Reader as _, Xlsx};

        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let sheet_name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&sheet_name).unwrap();
        range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    /// First column (dedupe key) of every data row.
    pub fn key_column(path: &Path) -> Vec<String> {
        read_rows(path)
            .into_iter()
            .skip(1)
            .map(|row| row[0].clone())
            .collect()
    }

    /// Extract cell ref -> style id from the first worksheet part.
    pub fn cell_style_ids(path: &Path) -> HashMap<String, u32> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut xml = Vec::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_end(&mut xml)
            .unwrap();

        let mut reader = Reader::from_reader(xml.as_slice());
        let mut buf = Vec::new();
        let mut ids = HashMap::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {
                    let mut cell_ref = None;
                    let mut style_id = None;
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        match attr.key.as_ref() {
                            b"r" => {
                                cell_ref = Some(String::from_utf8(attr.value.to_vec()).unwrap())
                            }
                            b"s" => {
                                style_id =
                                    std::str::from_utf8(&attr.value).unwrap().parse::<u32>().ok()
                            }
                            _ => {}
                        }
                    }
                    if let (Some(r), Some(s)) = (cell_ref, style_id) {
                        ids.insert(r, s);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => panic!("worksheet XML error: {}", e),
                _ => {}
            }
            buf.clear();
        }
        ids
    }

    /// Extract (displayName, ref) pairs from all table parts.
    pub fn table_refs(path: &Path) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .filter(|n| n.starts_with("xl/tables/") && n.ends_with(".xml"))
            .collect();

        let mut tables = Vec::new();
        for part_name in names {
            let mut xml = Vec::new();
            archive
                .by_name(&part_name)
                .unwrap()
                .read_to_end(&mut xml)
                .unwrap();

            let mut reader = Reader::from_reader(xml.as_slice());
            let mut buf = Vec::new();
            loop {
                match reader.read_event_into(&mut buf) {
                    Ok(Event::Start(e)) | Ok(Event::Empty(e))
                        if e.name().as_ref() == b"table" =>
                    {
                        let mut display_name = None;
                        let mut range_ref = None;
                        for attr in e.attributes() {
                            let attr = attr.unwrap();
                            match attr.key.as_ref() {
                                b"displayName" => {
                                    display_name =
                                        Some(String::from_utf8(attr.value.to_vec()).unwrap())
                                }
                                b"ref" => {
                                    range_ref =
                                        Some(String::from_utf8(attr.value.to_vec()).unwrap())
                                }
                                _ => {}
                            }
                        }
                        if let (Some(name), Some(r)) = (display_name, range_ref) {
                            tables.push((name, r));
                        }
                    }
                    Ok(Event::Eof) => break,
                    Err(e) => panic!("table XML error: {}", e),
                    _ => {}
                }
                buf.clear();
            }
        }
        tables
    }
}

fn merger(policy: AbsentPolicy) -> xlsxmerge::Merger {
    MergerBuilder::new()
        .with_absent_policy(policy)
        .with_key_selector(KeySelector::Column(1))
        .with_table_name("Portes")
        .build()
        .unwrap()
}

#[test]
fn test_merge_appends_only_novel_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 2, false); // keys 101, 102

    let batch = fixtures::batch(vec![
        fixtures::record(Some(102.0), "dup"),
        fixtures::record(Some(103.0), "new"),
        fixtures::record(Some(103.0), "dup-in-batch"),
    ]);
    let report = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    assert_eq!(report.status, RunStatus::Merged);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.appended, 1);
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.skipped_within_batch, 1);
    assert!(!report.bootstrapped);

    // Exactly one row with key 103, appended after the existing rows
    assert_eq!(inspect::key_column(&path), vec!["101", "102", "103"]);

    // First occurrence wins for the in-batch duplicate
    let rows = inspect::read_rows(&path);
    assert_eq!(rows[3][3], "new");
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 2, false);

    let batch = fixtures::batch(vec![
        fixtures::record(Some(103.0), "a"),
        fixtures::record(Some(104.0), "b"),
    ]);

    let first = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();
    let rows_after_first = inspect::read_rows(&path);
    let second = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    assert_eq!(first.appended, 2);
    assert_eq!(second.appended, 0);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(inspect::read_rows(&path), rows_after_first);
}

#[test]
fn test_existing_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 3, false); // 101, 102, 103

    let batch = fixtures::batch(vec![
        fixtures::record(Some(50.0), "x"),
        fixtures::record(Some(102.0), "dup"),
        fixtures::record(Some(49.0), "y"),
    ]);
    merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    // Existing rows keep their order; new rows follow in arrival order
    assert_eq!(
        inspect::key_column(&path),
        vec!["101", "102", "103", "50", "49"]
    );
}

#[test]
fn test_table_region_is_resized_to_new_extent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    // Header + 9 data rows, table "Portes" over A1:F10
    fixtures::write_base_container(&path, 9, true);
    assert_eq!(
        inspect::table_refs(&path),
        vec![("Portes".to_string(), "A1:F10".to_string())]
    );

    // 3 novel records (109 already exists), columns unchanged
    let batch = fixtures::batch(vec![
        fixtures::record(Some(109.0), "dup"),
        fixtures::record(Some(110.0), "a"),
        fixtures::record(Some(111.0), "b"),
        fixtures::record(Some(112.0), "c"),
    ]);
    let report = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    assert_eq!(report.appended, 3);
    assert_eq!(report.table, TableOutcome::Updated("A1:F13".to_string()));
    assert_eq!(
        inspect::table_refs(&path),
        vec![("Portes".to_string(), "A1:F13".to_string())]
    );
}

#[test]
fn test_missing_table_region_is_nonfatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 2, false);

    let batch = fixtures::batch(vec![fixtures::record(Some(103.0), "a")]);
    let report = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    // Data is saved even though the boundary update was skipped
    assert_eq!(report.table, TableOutcome::Missing);
    assert_eq!(report.appended, 1);
    assert_eq!(inspect::key_column(&path), vec!["101", "102", "103"]);
    assert!(inspect::table_refs(&path).is_empty());
}

#[test]
fn test_table_region_is_created_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 2, false);

    let merger = MergerBuilder::new()
        .with_absent_policy(AbsentPolicy::Abort)
        .with_table_name("Portes")
        .create_table_if_missing(true)
        .build()
        .unwrap();

    let batch = fixtures::batch(vec![fixtures::record(Some(103.0), "a")]);
    let report = merger.run(&path, &batch).unwrap();

    assert_eq!(report.table, TableOutcome::Created("A1:F4".to_string()));
    assert_eq!(
        inspect::table_refs(&path),
        vec![("Portes".to_string(), "A1:F4".to_string())]
    );
}

#[test]
fn test_appended_rows_inherit_predecessor_style() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    // Last existing data row (sheet row 4) carries a solid fill
    fixtures::write_base_container(&path, 3, false);

    let batch = fixtures::batch(vec![
        fixtures::record(Some(104.0), "a"),
        fixtures::record(Some(105.0), "b"),
    ]);
    merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();

    let styles = inspect::cell_style_ids(&path);
    for col in ["A", "B", "C", "D", "E", "F"] {
        let predecessor = styles.get(&format!("{}4", col));
        assert!(predecessor.is_some(), "styled base row lost its format");
        // Both appended rows must carry the same format as sheet row 4
        assert_eq!(styles.get(&format!("{}5", col)), predecessor);
        assert_eq!(styles.get(&format!("{}6", col)), predecessor);
    }
}

#[test]
fn test_null_key_records_are_always_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 1, false);

    let batch = fixtures::batch(vec![
        fixtures::record(None, "sin clave"),
        fixtures::record(None, "sin clave"),
    ]);

    // Both identical null-key records are appended, twice over two runs
    let first = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();
    assert_eq!(first.appended, 2);
    let second = merger(AbsentPolicy::Abort).run(&path, &batch).unwrap();
    assert_eq!(second.appended, 2);

    assert_eq!(inspect::read_rows(&path).len(), 1 + 1 + 4);
}

#[test]
fn test_composite_key_over_two_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Portes.xlsx");
    fixtures::write_base_container(&path, 2, false);

    let merger = MergerBuilder::new()
        .with_absent_policy(AbsentPolicy::Abort)
        .with_key_selector(KeySelector::Columns(vec![1, 4]))
        .build()
        .unwrap();

    // Same id as an existing row but different client -> novel composite key
    let batch = fixtures::batch(vec![fixtures::record(Some(102.0), "Otro Cliente")]);
    let report = merger.run(&path, &batch).unwrap();

    assert_eq!(report.appended, 1);
    assert_eq!(inspect::key_column(&path), vec!["101", "102", "102"]);
}
