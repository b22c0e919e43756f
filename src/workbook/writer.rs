//! Workbook Writer Module
//!
//! メモリ上の[`Sheet`]をrust_xlsxwriterでコンテナに書き出すモジュール。
//! 保存は一時ファイルへの書き出しとリネームによる原子的置換で行う。
//! 途中で失敗した場合、既存のコンテナは変更されない。

use std::path::{Path, PathBuf};

use chrono::Timelike;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Table, TableColumn, TableStyle, Workbook, Worksheet,
};

use crate::api::TableStylePreset;
use crate::error::XlsxMergeError;
use crate::sheet::Sheet;
use crate::style::CellStyle;
use crate::types::{column_letter, CellValue};

/// シートをコンテナとして保存する
///
/// # 引数
///
/// * `path` - 保存先のパス
/// * `sheet` - 保存するシート
///
/// # 動作
///
/// ワークブック全体をメモリ上で構築し、`<path>.tmp`へ書き出してから
/// リネームで置き換えます。保存が完了しなかった場合、保存先の
/// 既存ファイルはそのまま残ります。
pub(crate) fn save_container(path: &Path, sheet: &Sheet) -> Result<(), XlsxMergeError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.title.as_str())?;

    // 1. ヘッダー行（行0）
    for (col, label) in sheet.header.iter().enumerate() {
        let Ok(col16) = u16::try_from(col) else {
            continue;
        };
        match sheet.header_styles.get(col).and_then(|s| s.as_ref()) {
            Some(style) => {
                worksheet.write_string_with_format(0, col16, label.as_str(), &to_format(style))?;
            }
            None => {
                worksheet.write_string(0, col16, label.as_str())?;
            }
        }
    }

    // 2. データ行（行1以降）
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let out_row = row_idx as u32 + 1;
        for (col, value) in row.cells.iter().enumerate() {
            let Ok(col16) = u16::try_from(col) else {
                continue;
            };
            let style = row.styles.get(col).and_then(|s| s.as_ref());
            write_cell(worksheet, out_row, col16, value, style)?;
        }
    }

    // 3. テーブル領域
    for region in &sheet.tables {
        // ヘッダーのみの退化した範囲は登録できない
        if region.range.end.row <= region.range.start.row {
            continue;
        }
        let columns: Vec<TableColumn> = (region.range.start.col..=region.range.end.col)
            .map(|col| {
                let label = sheet
                    .header
                    .get(col as usize - 1)
                    .cloned()
                    .unwrap_or_else(|| format!("Column{}", column_letter(col)));
                TableColumn::new().set_header(label)
            })
            .collect();

        let mut table = Table::new()
            .set_name(region.name.as_str())
            .set_columns(&columns);
        if region.style != TableStylePreset::None {
            table = table.set_style(table_style_for(region.style));
        }

        worksheet.add_table(
            region.range.start.row - 1,
            (region.range.start.col - 1) as u16,
            region.range.end.row - 1,
            (region.range.end.col - 1) as u16,
            &table,
        )?;
    }

    // 4. 一時ファイルへ書き出し、リネームで置き換える
    let buffer = workbook.save_to_buffer()?;
    let tmp_path = sibling_tmp_path(path);
    std::fs::write(&tmp_path, &buffer)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// セル1個を書き出す（プライベート）
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    style: Option<&CellStyle>,
) -> Result<(), XlsxMergeError> {
    match value {
        CellValue::Number(n) => match style {
            Some(style) => {
                worksheet.write_number_with_format(row, col, *n, &to_format(style))?;
            }
            None => {
                worksheet.write_number(row, col, *n)?;
            }
        },
        CellValue::String(s) => match style {
            Some(style) => {
                worksheet.write_string_with_format(row, col, s.as_str(), &to_format(style))?;
            }
            None => {
                worksheet.write_string(row, col, s.as_str())?;
            }
        },
        CellValue::Bool(b) => match style {
            Some(style) => {
                worksheet.write_boolean_with_format(row, col, *b, &to_format(style))?;
            }
            None => {
                worksheet.write_boolean(row, col, *b)?;
            }
        },
        CellValue::DateTime(dt) => {
            // 日時セルは表示書式を持たないと生のシリアル値で表示されてしまう
            let base = style.map(to_format).unwrap_or_else(Format::new);
            let format = base.set_num_format(date_num_format(dt));
            worksheet.write_datetime_with_format(row, col, dt, &format)?;
        }
        CellValue::Error(code) => match style {
            Some(style) => {
                worksheet.write_string_with_format(row, col, code.as_str(), &to_format(style))?;
            }
            None => {
                worksheet.write_string(row, col, code.as_str())?;
            }
        },
        CellValue::Empty => {
            if let Some(style) = style {
                worksheet.write_blank(row, col, &to_format(style))?;
            }
        }
    }
    Ok(())
}

/// 日時セルの表示書式を選ぶ（プライベート）
///
/// 時刻が0:00:00ちょうどなら日付のみの書式にする。
fn date_num_format(dt: &chrono::NaiveDateTime) -> &'static str {
    if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
        "yyyy-mm-dd"
    } else {
        "yyyy-mm-dd hh:mm:ss"
    }
}

/// 書式バンドルをrust_xlsxwriterのFormatに変換（プライベート）
fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    // フォント
    if style.font.bold {
        format = format.set_bold();
    }
    if style.font.italic {
        format = format.set_italic();
    }
    if let Some(name) = style.font.name.as_deref() {
        format = format.set_font_name(name);
    }
    if let Some(size) = style.font.size {
        format = format.set_font_size(size);
    }
    if let Some(rgb) = style.font.color.as_deref().and_then(parse_argb) {
        format = format.set_font_color(Color::RGB(rgb));
    }

    // 塗りつぶし
    if let Some(rgb) = style.fill.solid_color.as_deref().and_then(parse_argb) {
        format = format.set_background_color(Color::RGB(rgb));
    }

    // 罫線
    if let Some(line) = style.border.top.as_deref() {
        format = format.set_border_top(border_for(line));
    }
    if let Some(line) = style.border.bottom.as_deref() {
        format = format.set_border_bottom(border_for(line));
    }
    if let Some(line) = style.border.left.as_deref() {
        format = format.set_border_left(border_for(line));
    }
    if let Some(line) = style.border.right.as_deref() {
        format = format.set_border_right(border_for(line));
    }

    // 配置
    if let Some(align) = style.alignment.horizontal.as_deref() {
        format = match align {
            "left" => format.set_align(FormatAlign::Left),
            "center" => format.set_align(FormatAlign::Center),
            "right" => format.set_align(FormatAlign::Right),
            "fill" => format.set_align(FormatAlign::Fill),
            "justify" => format.set_align(FormatAlign::Justify),
            "centerContinuous" => format.set_align(FormatAlign::CenterAcross),
            "distributed" => format.set_align(FormatAlign::Distributed),
            _ => format,
        };
    }
    if let Some(align) = style.alignment.vertical.as_deref() {
        format = match align {
            "top" => format.set_align(FormatAlign::Top),
            "center" => format.set_align(FormatAlign::VerticalCenter),
            "bottom" => format.set_align(FormatAlign::Bottom),
            "justify" => format.set_align(FormatAlign::VerticalJustify),
            "distributed" => format.set_align(FormatAlign::VerticalDistributed),
            _ => format,
        };
    }

    format
}

/// ARGB16進文字列（"FFRRGGBB"または"RRGGBB"）をRGB値に変換（プライベート）
fn parse_argb(hex: &str) -> Option<u32> {
    let rgb_part = match hex.len() {
        8 => &hex[2..],
        6 => hex,
        _ => return None,
    };
    u32::from_str_radix(rgb_part, 16).ok()
}

/// 罫線の線種名をFormatBorderに変換（プライベート）
fn border_for(line: &str) -> FormatBorder {
    match line {
        "thin" => FormatBorder::Thin,
        "medium" => FormatBorder::Medium,
        "thick" => FormatBorder::Thick,
        "dashed" => FormatBorder::Dashed,
        "dotted" => FormatBorder::Dotted,
        "double" => FormatBorder::Double,
        "hair" => FormatBorder::Hair,
        "mediumDashed" => FormatBorder::MediumDashed,
        "dashDot" => FormatBorder::DashDot,
        "mediumDashDot" => FormatBorder::MediumDashDot,
        "dashDotDot" => FormatBorder::DashDotDot,
        "mediumDashDotDot" => FormatBorder::MediumDashDotDot,
        "slantDashDot" => FormatBorder::SlantDashDot,
        _ => FormatBorder::Thin,
    }
}

/// スタイルプリセットをrust_xlsxwriterのTableStyleに変換（プライベート）
///
/// 範囲外の番号はExcelのテーブル既定スタイル（Medium 9）に落とす。
fn table_style_for(preset: TableStylePreset) -> TableStyle {
    match preset {
        TableStylePreset::None => TableStyle::None,
        TableStylePreset::Light(n) => match n {
            1 => TableStyle::Light1,
            2 => TableStyle::Light2,
            3 => TableStyle::Light3,
            4 => TableStyle::Light4,
            5 => TableStyle::Light5,
            6 => TableStyle::Light6,
            7 => TableStyle::Light7,
            8 => TableStyle::Light8,
            9 => TableStyle::Light9,
            10 => TableStyle::Light10,
            11 => TableStyle::Light11,
            12 => TableStyle::Light12,
            13 => TableStyle::Light13,
            14 => TableStyle::Light14,
            15 => TableStyle::Light15,
            16 => TableStyle::Light16,
            17 => TableStyle::Light17,
            18 => TableStyle::Light18,
            19 => TableStyle::Light19,
            20 => TableStyle::Light20,
            21 => TableStyle::Light21,
            _ => TableStyle::Medium9,
        },
        TableStylePreset::Medium(n) => match n {
            1 => TableStyle::Medium1,
            2 => TableStyle::Medium2,
            3 => TableStyle::Medium3,
            4 => TableStyle::Medium4,
            5 => TableStyle::Medium5,
            6 => TableStyle::Medium6,
            7 => TableStyle::Medium7,
            8 => TableStyle::Medium8,
            9 => TableStyle::Medium9,
            10 => TableStyle::Medium10,
            11 => TableStyle::Medium11,
            12 => TableStyle::Medium12,
            13 => TableStyle::Medium13,
            14 => TableStyle::Medium14,
            15 => TableStyle::Medium15,
            16 => TableStyle::Medium16,
            17 => TableStyle::Medium17,
            18 => TableStyle::Medium18,
            19 => TableStyle::Medium19,
            20 => TableStyle::Medium20,
            21 => TableStyle::Medium21,
            22 => TableStyle::Medium22,
            23 => TableStyle::Medium23,
            24 => TableStyle::Medium24,
            25 => TableStyle::Medium25,
            26 => TableStyle::Medium26,
            27 => TableStyle::Medium27,
            28 => TableStyle::Medium28,
            _ => TableStyle::Medium9,
        },
        TableStylePreset::Dark(n) => match n {
            1 => TableStyle::Dark1,
            2 => TableStyle::Dark2,
            3 => TableStyle::Dark3,
            4 => TableStyle::Dark4,
            5 => TableStyle::Dark5,
            6 => TableStyle::Dark6,
            7 => TableStyle::Dark7,
            8 => TableStyle::Dark8,
            9 => TableStyle::Dark9,
            10 => TableStyle::Dark10,
            11 => TableStyle::Dark11,
            _ => TableStyle::Medium9,
        },
    }
}

/// 同じディレクトリに一時ファイル名を作る（プライベート）
///
/// リネームが同一ファイルシステム内で完結するよう、保存先の隣に置く。
fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
