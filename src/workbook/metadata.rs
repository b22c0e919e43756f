//! XML Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得できない情報を抽出するモジュール。
//! セル書式（xl/styles.xml + ワークシートXMLのスタイルID）と
//! テーブル領域定義（xl/tables/*.xml）を提供します。
//!
//! 対象は先頭シート1枚のみ。ワークシートのパート名は
//! `xl/worksheets/sheet1.xml`を先頭シートとみなす簡易対応とする
//! （厳密にはworkbook.xmlのリレーション解決が必要だが、このクレートが
//! 扱うコンテナは単一シート前提）。

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::api::TableStylePreset;
use crate::error::XlsxMergeError;
use crate::style::{AlignStyle, BorderStyle, CellStyle, FillStyle, FontStyle};
use crate::table::TableRegion;
use crate::types::{CellCoord, CellRange};
use crate::workbook::{validate_part_path, OpenLimits};

/// 先頭シートの書式情報とテーブル領域定義
pub(crate) struct SheetFormatting {
    /// cellXfsインデックス -> 書式バンドル
    style_table: Vec<CellStyle>,

    /// セル座標（1始まり） -> cellXfsインデックス
    cell_style_ids: HashMap<CellCoord, u32>,

    /// 登録済みテーブル領域
    pub(crate) tables: Vec<TableRegion>,
}

impl SheetFormatting {
    /// XLSXコンテナ（ZIPアーカイブ）から書式情報を解析
    ///
    /// # 引数
    ///
    /// * `container` - コンテナを読み込むためのリーダー（Read + Seek）
    /// * `limits` - アーカイブ構造の制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(SheetFormatting)` - 解析に成功した場合
    /// * `Err(XlsxMergeError)` - アーカイブが制限に違反、または解析に失敗した場合
    pub fn parse<R: Read + Seek>(
        container: R,
        limits: &OpenLimits,
    ) -> Result<Self, XlsxMergeError> {
        let mut archive =
            ZipArchive::new(container).map_err(|e| XlsxMergeError::Zip(format!("{}", e)))?;

        // 制限チェック: パート数の上限
        if archive.len() > limits.max_part_count {
            return Err(XlsxMergeError::SecurityViolation(format!(
                "Container has too many parts: {} (max: {})",
                archive.len(),
                limits.max_part_count
            )));
        }

        // 制限チェック: 各パートのパス検証とサイズチェック
        for i in 0..archive.len() {
            let part = archive
                .by_index(i)
                .map_err(|e| XlsxMergeError::Zip(format!("{}", e)))?;

            validate_part_path(part.name())
                .map_err(|e| XlsxMergeError::SecurityViolation(format!("Invalid part path: {}", e)))?;

            if part.size() > limits.max_part_size {
                return Err(XlsxMergeError::SecurityViolation(format!(
                    "Part '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    part.name(),
                    part.size(),
                    limits.max_part_size
                )));
            }
        }

        // 1. xl/styles.xml を解析
        let style_table = Self::parse_styles(&mut archive)?;

        // 2. 先頭ワークシートのセル -> スタイルIDの対応を解析
        let cell_style_ids = Self::parse_first_worksheet(&mut archive)?;

        // 3. xl/tables/*.xml を解析
        let tables = Self::parse_tables(&mut archive)?;

        Ok(Self {
            style_table,
            cell_style_ids,
            tables,
        })
    }

    /// セル座標の書式バンドルを取得
    ///
    /// # 戻り値
    ///
    /// * `Some(&CellStyle)` - デフォルト以外の書式が付与されている場合
    /// * `None` - 書式なし、またはデフォルト書式の場合
    pub fn style_of(&self, coord: CellCoord) -> Option<&CellStyle> {
        let id = *self.cell_style_ids.get(&coord)?;
        let style = self.style_table.get(id as usize)?;
        if style.is_plain() {
            None
        } else {
            Some(style)
        }
    }

    /// xl/styles.xml の解析（プライベート）
    ///
    /// fonts / fills / borders / cellXfs を読み、cellXfsインデックスごとの
    /// 書式バンドルに解決します。
    fn parse_styles<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<CellStyle>, XlsxMergeError> {
        let mut styles_part = match archive.by_name("xl/styles.xml") {
            Ok(part) => part,
            // styles.xmlがないコンテナは書式なしとして扱う
            Err(_) => return Ok(Vec::new()),
        };

        let mut xml_content = Vec::new();
        styles_part.read_to_end(&mut xml_content)?;

        let mut reader = Reader::from_reader(xml_content.as_slice());
        let mut buf = Vec::new();
        let mut state = StylesState::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => state.start(&e)?,
                // 自己終了要素（<b/>等）は開始と終了を続けて処理する
                Ok(Event::Empty(e)) => {
                    state.start(&e)?;
                    let name = e.name().as_ref().to_vec();
                    state.end(&name);
                }
                Ok(Event::End(e)) => state.end(e.name().as_ref()),
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxMergeError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(state.resolve())
    }

    /// 先頭ワークシートXMLからセル -> スタイルIDの対応を解析（プライベート）
    fn parse_first_worksheet<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<HashMap<CellCoord, u32>, XlsxMergeError> {
        let mut cell_style_ids = HashMap::new();

        let mut sheet_part = match archive.by_name("xl/worksheets/sheet1.xml") {
            Ok(part) => part,
            Err(_) => return Ok(cell_style_ids),
        };

        let mut xml_content = Vec::new();
        sheet_part.read_to_end(&mut xml_content)?;

        let mut reader = Reader::from_reader(xml_content.as_slice());
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    // <c r="B2" s="3" t="s"> - 値の有無で自己終了にもなる
                    if e.name().as_ref() == b"c" {
                        let coord = attr_value(&e, b"r")?
                            .as_deref()
                            .and_then(CellCoord::parse_a1);
                        let style_id = attr_value(&e, b"s")?;
                        if let (Some(coord), Some(style_id)) = (coord, style_id) {
                            let style_id: u32 = style_id.parse()?;
                            if style_id > 0 {
                                cell_style_ids.insert(coord, style_id);
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxMergeError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(cell_style_ids)
    }

    /// xl/tables/*.xml の解析（プライベート）
    fn parse_tables<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<TableRegion>, XlsxMergeError> {
        // テーブル定義のパート名を先に収集する（by_nameと反復の同時借用を避ける）
        let mut part_names: Vec<String> = Vec::new();
        for i in 0..archive.len() {
            let name = archive
                .by_index(i)
                .map_err(|e| XlsxMergeError::Zip(format!("{}", e)))?
                .name()
                .to_string();
            if name.starts_with("xl/tables/") && name.ends_with(".xml") {
                part_names.push(name);
            }
        }
        part_names.sort();

        let mut tables = Vec::new();
        for part_name in part_names {
            let mut part = archive
                .by_name(&part_name)
                .map_err(|e| XlsxMergeError::Zip(format!("{}", e)))?;
            let mut xml_content = Vec::new();
            part.read_to_end(&mut xml_content)?;
            drop(part);

            if let Some(region) = Self::parse_table_xml(&xml_content)? {
                tables.push(region);
            }
        }

        Ok(tables)
    }

    /// 1つのテーブル定義XMLを解析（プライベート）
    ///
    /// `<table displayName="Portes" ref="A1:F10">`と
    /// `<tableStyleInfo name="TableStyleMedium9"/>`を読み取ります。
    fn parse_table_xml(xml_content: &[u8]) -> Result<Option<TableRegion>, XlsxMergeError> {
        let mut reader = Reader::from_reader(xml_content);
        let mut buf = Vec::new();

        let mut name: Option<String> = None;
        let mut range: Option<CellRange> = None;
        let mut style = TableStylePreset::None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"table" => {
                        // displayNameが表示名。無い場合はname属性で代用する
                        name = match attr_value(&e, b"displayName")? {
                            Some(display_name) => Some(display_name),
                            None => attr_value(&e, b"name")?,
                        };
                        range = attr_value(&e, b"ref")?
                            .as_deref()
                            .and_then(CellRange::parse_ref);
                    }
                    b"tableStyleInfo" => {
                        if let Some(style_name) = attr_value(&e, b"name")? {
                            if let Some(preset) = TableStylePreset::from_style_name(&style_name) {
                                style = preset;
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxMergeError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
            buf.clear();
        }

        match (name, range) {
            (Some(name), Some(range)) => Ok(Some(TableRegion { name, range, style })),
            _ => Ok(None),
        }
    }
}

/// styles.xml解析の状態機械（プライベート）
#[derive(Default)]
struct StylesState {
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    xfs: Vec<(usize, usize, usize, AlignStyle)>,

    in_fonts: bool,
    in_fills: bool,
    in_borders: bool,
    in_cell_xfs: bool,
    font: Option<FontStyle>,
    fill: Option<FillStyle>,
    fill_is_solid: bool,
    border: Option<BorderStyle>,
    xf: Option<(usize, usize, usize, AlignStyle)>,
}

impl StylesState {
    fn start(&mut self, e: &BytesStart<'_>) -> Result<(), XlsxMergeError> {
        match e.name().as_ref() {
            b"fonts" => self.in_fonts = true,
            b"font" if self.in_fonts => self.font = Some(FontStyle::default()),
            b"b" => {
                if let Some(font) = self.font.as_mut() {
                    font.bold = true;
                }
            }
            b"i" => {
                if let Some(font) = self.font.as_mut() {
                    font.italic = true;
                }
            }
            b"sz" => {
                if let Some(font) = self.font.as_mut() {
                    if let Some(val) = attr_value(e, b"val")? {
                        font.size = val.parse().ok();
                    }
                }
            }
            b"name" => {
                if let Some(font) = self.font.as_mut() {
                    font.name = attr_value(e, b"val")?;
                }
            }
            b"color" => {
                // テーマ色・インデックス色はrgb属性を持たないため保持しない
                if let Some(font) = self.font.as_mut() {
                    font.color = attr_value(e, b"rgb")?;
                }
            }
            b"fills" => self.in_fills = true,
            b"fill" if self.in_fills => {
                self.fill = Some(FillStyle::default());
                self.fill_is_solid = false;
            }
            b"patternFill" => {
                if self.fill.is_some() {
                    self.fill_is_solid =
                        attr_value(e, b"patternType")?.as_deref() == Some("solid");
                }
            }
            b"fgColor" => {
                if self.fill_is_solid {
                    if let Some(fill) = self.fill.as_mut() {
                        fill.solid_color = attr_value(e, b"rgb")?;
                    }
                }
            }
            b"borders" => self.in_borders = true,
            b"border" if self.in_borders => self.border = Some(BorderStyle::default()),
            b"left" => {
                if let Some(border) = self.border.as_mut() {
                    border.left = attr_value(e, b"style")?;
                }
            }
            b"right" => {
                if let Some(border) = self.border.as_mut() {
                    border.right = attr_value(e, b"style")?;
                }
            }
            b"top" => {
                if let Some(border) = self.border.as_mut() {
                    border.top = attr_value(e, b"style")?;
                }
            }
            b"bottom" => {
                if let Some(border) = self.border.as_mut() {
                    border.bottom = attr_value(e, b"style")?;
                }
            }
            b"cellXfs" => self.in_cell_xfs = true,
            b"xf" if self.in_cell_xfs => {
                // <xf numFmtId="0" fontId="1" fillId="2" borderId="0"/>
                let font_id = parse_id_attr(e, b"fontId")?;
                let fill_id = parse_id_attr(e, b"fillId")?;
                let border_id = parse_id_attr(e, b"borderId")?;
                self.xf = Some((font_id, fill_id, border_id, AlignStyle::default()));
            }
            b"alignment" => {
                if let Some((_, _, _, alignment)) = self.xf.as_mut() {
                    alignment.horizontal = attr_value(e, b"horizontal")?;
                    alignment.vertical = attr_value(e, b"vertical")?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"fonts" => self.in_fonts = false,
            b"font" => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fills" => self.in_fills = false,
            b"fill" => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill);
                }
                self.fill_is_solid = false;
            }
            b"borders" => self.in_borders = false,
            b"border" => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            }
            b"cellXfs" => self.in_cell_xfs = false,
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    self.xfs.push(xf);
                }
            }
            _ => {}
        }
    }

    /// fonts / fills / bordersのIDを解決して書式バンドルの表にする
    fn resolve(self) -> Vec<CellStyle> {
        self.xfs
            .iter()
            .map(|(font_id, fill_id, border_id, alignment)| CellStyle {
                font: self.fonts.get(*font_id).cloned().unwrap_or_default(),
                fill: self.fills.get(*fill_id).cloned().unwrap_or_default(),
                border: self.borders.get(*border_id).cloned().unwrap_or_default(),
                alignment: alignment.clone(),
            })
            .collect()
    }
}

/// XML要素から属性値を取得（プライベートヘルパー）
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XlsxMergeError> {
    for attr in e.attributes() {
        let attr =
            attr.map_err(|e| XlsxMergeError::Config(format!("XML attribute error: {}", e)))?;
        if attr.key.as_ref() == key {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

/// ID属性（usize、省略時0）を取得（プライベートヘルパー）
fn parse_id_attr(e: &BytesStart<'_>, key: &[u8]) -> Result<usize, XlsxMergeError> {
    match attr_value(e, key)? {
        Some(value) => Ok(value.parse()?),
        None => Ok(0),
    }
}
