//! Record Source Module
//!
//! 外部クエリ結果を不透明なレコード列として受け取るためのモジュール。
//! データソースの接続・SQL方言はこのクレートの関知しない領域であり、
//! ここではヘッダー付きの型付きタプル列という形だけを定義する。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::XlsxMergeError;
use crate::types::CellValue;

/// 1回の取得結果（ヘッダー + 型付き行タプルの列）
///
/// 行の順序は取得順のまま保持され、マージでも並べ替えられません。
/// serdeに対応しており、JSONとしての受け渡しができます（デモツールの
/// 入力形式、およびテストフィクスチャ）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    /// 列名（クエリの出力ラベルそのまま）
    pub header: Vec<String>,

    /// 行タプルの列（各行は`header`と同じ幅）
    pub rows: Vec<Vec<CellValue>>,
}

impl RecordBatch {
    /// 新しいバッチを生成
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { header, rows }
    }

    /// バッチの形状を検証する
    ///
    /// ヘッダーが空でないこと、および全行の幅がヘッダーと一致することを
    /// 確認します。形状以外（値の内容）の検証は行いません。
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 形状が正しい場合
    /// * `Err(XlsxMergeError::SchemaMismatch)` - 幅の不一致がある場合
    /// * `Err(XlsxMergeError::Config)` - ヘッダーが空の場合
    pub fn validate(&self) -> Result<(), XlsxMergeError> {
        if self.header.is_empty() {
            return Err(XlsxMergeError::Config(
                "record batch header must not be empty".to_string(),
            ));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.header.len() {
                return Err(XlsxMergeError::SchemaMismatch(format!(
                    "record {} has {} values, header has {} columns",
                    i + 1,
                    row.len(),
                    self.header.len()
                )));
            }
        }
        Ok(())
    }

    /// レコード数を取得
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// レコードが1件もないかを判定
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// レコードソースアダプター
///
/// 日付ウィンドウを受け取り、その期間のレコードを取得します。
/// 実装は外部の関心事（データベースドライバ、ファイル読み込み等）であり、
/// 接続やクエリの失敗は[`XlsxMergeError::SourceUnavailable`]で返します。
/// その場合、呼び出し側は何も書き込まずに実行全体を中断します。
pub trait RecordSource {
    /// 指定された日付ウィンドウのレコードを取得
    fn fetch(&mut self, window: &DateWindow) -> Result<RecordBatch, XlsxMergeError>;
}

/// スライドする日付ウィンドウ（両端を含む）
///
/// 定期実行のたびに「今日」を終端として再計算される取得期間です。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// 期間の開始日
    pub start: NaiveDate,

    /// 期間の終了日
    pub end: NaiveDate,
}

impl DateWindow {
    /// 新しいウィンドウを生成
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 終端から数ヶ月遡るウィンドウを生成
    ///
    /// 開始日は`months`ヶ月前の月の1日になります（月初に切り詰め）。
    /// 例: 終端が2026-01-15で`months = 2`なら、開始は2025-11-01。
    ///
    /// # 引数
    ///
    /// * `end` - ウィンドウの終端（通常は実行日）
    /// * `months` - 遡る月数
    pub fn trailing_months(end: NaiveDate, months: u32) -> Self {
        let total = end.year() * 12 + end.month0() as i32 - months as i32;
        let year = total.div_euclid(12);
        let month = total.rem_euclid(12) as u32 + 1;
        // 月は1..=12、日は1なので必ず有効な日付になる
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .expect("first day of a valid month");
        Self { start, end }
    }

    /// ISO 8601形式（YYYY-MM-DD）の両端を取得
    ///
    /// ソースアダプターがクエリへ埋め込むための文字列表現です。
    pub fn iso_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }
}
