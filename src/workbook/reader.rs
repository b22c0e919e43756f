//! Workbook Reader Module
//!
//! コンテナを開いて先頭シートをメモリ上の[`Sheet`]に復元するモジュール。
//! セル値はcalamineで、書式とテーブル領域はXMLメタデータ解析で取得する。

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};

use crate::error::XlsxMergeError;
use crate::sheet::Sheet;
use crate::types::{CellCoord, CellValue};
use crate::workbook::metadata::SheetFormatting;
use crate::workbook::OpenLimits;

/// コンテナを開き、先頭シートを復元する
///
/// # 引数
///
/// * `path` - コンテナのパス
/// * `limits` - 読み込み制限
///
/// # 戻り値
///
/// * `Ok(Some(Sheet))` - 読み込みに成功した場合
/// * `Ok(None)` - パスが既存ファイルに解決できない場合（欠損）。
///   欠損時の扱い（中断かブートストラップか）は呼び出し側のポリシーに
///   委ねるため、ここではエラーにしない
/// * `Err(XlsxMergeError)` - 存在するが読み込めない場合
pub(crate) fn open_container(
    path: &Path,
    limits: &OpenLimits,
) -> Result<Option<Sheet>, XlsxMergeError> {
    // 1. 欠損判定
    if !path.exists() {
        return Ok(None);
    }

    // 2. ファイル全体をメモリに読み込む（サイズ制限を適用）
    let mut buffer = Vec::new();
    let bytes_read = File::open(path)?.read_to_end(&mut buffer)?;
    if bytes_read as u64 > limits.max_container_size {
        return Err(XlsxMergeError::SecurityViolation(format!(
            "Container size exceeds maximum: {} bytes (max: {} bytes)",
            bytes_read, limits.max_container_size
        )));
    }

    // 3. calamineで先頭シートのセル値を読む
    let sheets =
        open_workbook_auto_from_rs(Cursor::new(buffer.clone())).map_err(XlsxMergeError::Parse)?;
    let mut workbook = match sheets {
        Sheets::Xlsx(workbook) => workbook,
        _ => {
            return Err(XlsxMergeError::Config(
                "Only XLSX containers are supported".to_string(),
            ))
        }
    };

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| XlsxMergeError::Config("Workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| XlsxMergeError::Parse(e.into()))?;

    // 4. 値グリッドをSheetへ変換
    let mut sheet = build_sheet(&sheet_name, &range);

    // 5. 書式とテーブル領域を重ねる
    let formatting = SheetFormatting::parse(Cursor::new(buffer), limits)?;
    apply_formatting(&mut sheet, &formatting);
    sheet.tables = formatting.tables;

    Ok(Some(sheet))
}

/// calamineの値グリッドからSheetを構築（プライベート）
///
/// 使用範囲がA1から始まらない場合（先頭に空行・空列がある場合）は、
/// 位置を保つために空値で左上を埋めます。行1をヘッダーとして扱います。
fn build_sheet(sheet_name: &str, range: &calamine::Range<Data>) -> Sheet {
    let Some((start_row, start_col)) = range.start() else {
        // セルが1つもないシート。ヘッダーなしとして返し、
        // 列レイアウト検証で明示的に弾かれるようにする
        return Sheet::new(sheet_name, Vec::new());
    };

    let width = start_col as usize + range.width();

    // 行0（シート行1）= ヘッダー
    let mut grid_rows = Vec::new();
    for (i, row) in range.rows().enumerate() {
        let absolute_row = start_row as usize + i;
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        grid_rows.push((absolute_row, cells));
    }

    let header = match grid_rows.first() {
        Some((0, cells)) => cells.iter().map(CellValue::to_display_string).collect(),
        // 行1が空のままデータが下にあるコンテナ: ヘッダーは空ラベルで埋める
        _ => vec![String::new(); width],
    };

    let mut sheet = Sheet::new(sheet_name, header);
    for (absolute_row, cells) in grid_rows {
        if absolute_row == 0 {
            continue;
        }
        // 使用範囲が行1より下から始まる場合の空行も位置合わせのため追加する
        while sheet.rows.len() + 1 < absolute_row {
            sheet.append_record(vec![CellValue::Empty; width]);
        }
        sheet.append_record(cells);
    }
    sheet
}

/// calamineのセル値を変換（プライベート）
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        _ => CellValue::Empty,
    }
}

/// 解析済みの書式をシートの各セルへ適用（プライベート）
fn apply_formatting(sheet: &mut Sheet, formatting: &SheetFormatting) {
    // ヘッダー行（シート行1）
    for col in 0..sheet.header.len() {
        if let Some(style) = formatting.style_of(CellCoord::new(1, col as u32 + 1)) {
            sheet.header_styles[col] = Some(style.clone());
        }
    }

    // データ行（シート行2以降）
    for row_idx in 0..sheet.rows.len() {
        let sheet_row = row_idx as u32 + 2;
        let col_count = sheet.rows[row_idx].cells.len();
        for col in 0..col_count {
            if let Some(style) = formatting.style_of(CellCoord::new(sheet_row, col as u32 + 1)) {
                sheet.rows[row_idx].styles[col] = Some(style.clone());
            }
        }
    }
}

// テストは統合テスト（tests/）で実装します。
// 書き出し側（writer）と組み合わせたround-tripとして検証します。
