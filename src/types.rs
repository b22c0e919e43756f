//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! 行・列インデックスはすべて1始まり（シート表記と同じ）で統一する。
//! calamine（0始まり）とrust_xlsxwriter（0始まり）への変換は
//! workbookモジュールの境界でのみ行う。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// セルの値を表す列挙型
///
/// レコードソースから届く型付きタプルの要素、および既存ワークブックの
/// セル値の両方をこの型で表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 日時（タイムゾーンなし）
    DateTime(NaiveDateTime),

    /// エラー値（例: #DIV/0!）。既存ワークブックの読み込みでのみ発生する
    Error(String),

    /// 空セル（SQLのNULLに相当）
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 値を表示用文字列として取得
    ///
    /// ヘッダーラベルの比較やレポート出力に使用します。
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// セル座標（行・列とも1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (1, 1) -> "A1"）
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }

    /// A1形式の文字列から座標を生成（例: "F13" -> (13, 6)）
    ///
    /// # 戻り値
    ///
    /// * `Some(CellCoord)` - 解析に成功した場合
    /// * `None` - 列文字または行番号が不正な場合
    pub fn parse_a1(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = column_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { row, col })
    }
}

/// セル範囲（両端を含む矩形）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 範囲参照文字列に変換（例: "A1:F13"）
    pub fn to_ref(&self) -> String {
        format!("{}:{}", self.start.to_a1(), self.end.to_a1())
    }

    /// 範囲参照文字列から範囲を生成
    ///
    /// `"A1:F13"`形式のほか、単一セルの`"A1"`形式も受け付けます
    /// （start == endの範囲になる）。
    pub fn parse_ref(s: &str) -> Option<Self> {
        match s.split_once(':') {
            Some((first, last)) => {
                let start = CellCoord::parse_a1(first)?;
                let end = CellCoord::parse_a1(last)?;
                Some(Self { start, end })
            }
            None => {
                let coord = CellCoord::parse_a1(s)?;
                Some(Self {
                    start: coord,
                    end: coord,
                })
            }
        }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

/// 列番号（1始まり）をアルファベット表記に変換
///
/// 26進アルファベット表記（A, B, ..., Z, AA, AB, ...）を生成します。
/// 例: 1 -> "A", 26 -> "Z", 27 -> "AA", 703 -> "AAA"
pub fn column_letter(col: u32) -> String {
    let mut col = col;
    let mut letters = String::new();
    while col > 0 {
        let remainder = ((col - 1) % 26) as u8;
        letters.insert(0, (b'A' + remainder) as char);
        col = (col - 1) / 26;
    }
    letters
}

/// アルファベット表記を列番号（1始まり）に変換
///
/// # 戻り値
///
/// * `Some(u32)` - 変換に成功した場合
/// * `None` - 空文字列、または英大文字以外を含む場合
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        index = index.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
    }
    Some(index)
}
