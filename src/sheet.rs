//! Sheet Module
//!
//! メモリ上のシート表現を定義するモジュール。
//! 実行開始時にコンテナから一度だけ読み込まれ、マージ中にメモリ上で
//! 変更され、実行終了時に一度だけ保存される。中間チェックポイントはない。
//!
//! 行1はヘッダー行として予約され、マージによって変更されることはない。
//! データ行は行2以降に並び、追記のみが行われる（既存行の変更・削除・
//! 並べ替えは行わない）。

use crate::style::CellStyle;
use crate::table::TableRegion;
use crate::types::CellValue;

/// データ行1行分
///
/// セル値の並びと、並行する書式バンドルの並びを保持します。
/// `styles[i]`は`cells[i]`に対応します（`None`は書式なし）。
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// セル値（列順）
    pub cells: Vec<CellValue>,

    /// セル書式（列順、`cells`と並行）
    pub styles: Vec<Option<CellStyle>>,
}

impl Row {
    /// 書式なしの行を生成
    pub fn plain(cells: Vec<CellValue>) -> Self {
        let styles = vec![None; cells.len()];
        Self { cells, styles }
    }
}

/// メモリ上のシート
///
/// ヘッダー行・データ行・登録済みテーブル領域を保持します。
/// 1回の実行がこの表現を排他的に所有し、並行実行との共有はありません。
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// シート名
    pub title: String,

    /// ヘッダー行（行1）の列ラベル
    pub header: Vec<String>,

    /// ヘッダー行のセル書式（`header`と並行）
    pub header_styles: Vec<Option<CellStyle>>,

    /// データ行（行2以降）。`rows[0]`がシート行2に対応する
    pub rows: Vec<Row>,

    /// 登録済みテーブル領域
    pub tables: Vec<TableRegion>,
}

impl Sheet {
    /// 書式なしの空シートを生成
    ///
    /// コンテナ読み込み側が値・書式・テーブル領域を埋めるための土台です。
    pub fn new(title: &str, header: Vec<String>) -> Self {
        let header_styles = vec![None; header.len()];
        Self {
            title: title.to_string(),
            header,
            header_styles,
            rows: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// ヘッダー行だけを持つ最小構成のシートを合成する
    ///
    /// ベースコンテナが存在しない場合のブートストラップに使用します。
    /// ヘッダー行には太字書式が付与されます。
    pub fn bootstrap(title: &str, header: Vec<String>) -> Self {
        let header_styles = vec![Some(CellStyle::bold()); header.len()];
        Self {
            title: title.to_string(),
            header,
            header_styles,
            rows: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// データ行を末尾に追記する
    ///
    /// # 戻り値
    ///
    /// 追記された行のシート行番号（1始まり。最初のデータ行なら2）
    pub fn append_record(&mut self, cells: Vec<CellValue>) -> u32 {
        self.rows.push(Row::plain(cells));
        (1 + self.rows.len()) as u32
    }

    /// ヘッダーを含む総行数（= 最終行番号）
    pub fn last_row(&self) -> u32 {
        (1 + self.rows.len()) as u32
    }

    /// ヘッダーと全データ行にわたる占有セル列数（= 最終列番号）
    pub fn last_col(&self) -> u32 {
        let mut cols = self.header.len();
        for row in &self.rows {
            cols = cols.max(row.cells.len());
        }
        cols as u32
    }

    /// 名前でテーブル領域を検索
    pub fn table(&self, name: &str) -> Option<&TableRegion> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// 名前でテーブル領域を検索（可変参照）
    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableRegion> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}
