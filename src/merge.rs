//! Dedup & Merge Module
//!
//! 受信バッチのうちシートに未登録のレコードだけを追記するマージエンジン。
//! 既存行の変更・削除・並べ替えは一切行わず、追記のみを行う。
//!
//! キーの等価性は厳密な値の一致で判定する。キーセルが空の行はどの行とも
//! 一致せず常に追記される。これは「キーを持たない行は重複排除の対象外」
//! という運用上の決定であり、バグではない。

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::api::KeySelector;
use crate::sheet::Sheet;
use crate::source::RecordBatch;
use crate::types::CellValue;

/// 重複排除キーの値
///
/// セル値から導出される、ハッシュ可能な等価比較用の表現です。
/// 数値はf64のビット表現で保持します（厳密な値一致）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupeKey {
    /// 数値（f64のビット表現）
    Number(u64),

    /// 文字列
    Text(String),

    /// 論理値
    Bool(bool),

    /// 日時
    DateTime(NaiveDateTime),

    /// 複数列の組
    Composite(Vec<DedupeKey>),
}

impl DedupeKey {
    /// セル値からキーを導出
    ///
    /// 空セルはキーを構成しません。エラー値のセルも同様に扱います
    /// （エラー値同士を同一視して行を潰さないため）。
    fn from_value(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Number(n) => Some(DedupeKey::Number(n.to_bits())),
            CellValue::String(s) => Some(DedupeKey::Text(s.clone())),
            CellValue::Bool(b) => Some(DedupeKey::Bool(*b)),
            CellValue::DateTime(dt) => Some(DedupeKey::DateTime(*dt)),
            CellValue::Error(_) | CellValue::Empty => None,
        }
    }
}

/// 行からキーを導出する
///
/// # 戻り値
///
/// * `Some(DedupeKey)` - キーが導出できた場合
/// * `None` - キーセルが空・エラー値・範囲外の場合。
///   複数列キーでは、構成列のいずれかが該当すればキー全体が空になります
pub(crate) fn record_key(selector: &KeySelector, cells: &[CellValue]) -> Option<DedupeKey> {
    match selector {
        KeySelector::Column(col) => {
            let value = cells.get(col.checked_sub(1)? as usize)?;
            DedupeKey::from_value(value)
        }
        KeySelector::Columns(cols) => {
            let mut parts = Vec::with_capacity(cols.len());
            for col in cols {
                let value = cells.get(col.checked_sub(1)? as usize)?;
                parts.push(DedupeKey::from_value(value)?);
            }
            Some(DedupeKey::Composite(parts))
        }
    }
}

/// 1回のマージの統計
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeStats {
    /// 追記された行のシート行番号（1始まり、追記順）
    pub appended_rows: Vec<u32>,

    /// 既存行とキーが一致したためスキップされたレコード数
    pub skipped_existing: usize,

    /// バッチ内で先行レコードとキーが一致したためスキップされた数
    pub skipped_within_batch: usize,
}

/// 受信バッチをシートにマージする
///
/// 既存データ行からキー集合を構築し、受信レコードを到着順に走査して、
/// 未登録キーのレコードだけを末尾に追記します。バッチ内の重複は
/// 最初の1件だけが採用されます。
///
/// # 保証
///
/// * マージ後のキー集合 = 既存キー ∪ 受信ユニークキー
/// * 既存行は変更も削除もされない
/// * 追記行は受信順のまま並ぶ（キーや日付での並べ替えはしない）
///
/// # 副作用
///
/// シートの行列への追記のみ。書式とテーブル領域には触れません。
pub(crate) fn merge(sheet: &mut Sheet, batch: &RecordBatch, selector: &KeySelector) -> MergeStats {
    // 1. 既存行のキー集合を構築
    let existing: HashSet<DedupeKey> = sheet
        .rows
        .iter()
        .filter_map(|row| record_key(selector, &row.cells))
        .collect();

    // 2. 受信レコードを到着順に処理
    let mut batch_seen: HashSet<DedupeKey> = HashSet::new();
    let mut stats = MergeStats::default();

    for record in &batch.rows {
        match record_key(selector, record) {
            Some(key) => {
                if existing.contains(&key) {
                    stats.skipped_existing += 1;
                } else if batch_seen.contains(&key) {
                    stats.skipped_within_batch += 1;
                } else {
                    batch_seen.insert(key);
                    let row_index = sheet.append_record(record.clone());
                    stats.appended_rows.push(row_index);
                }
            }
            // キーなしの行は常に追記する
            None => {
                let row_index = sheet.append_record(record.clone());
                stats.appended_rows.push(row_index);
            }
        }
    }

    stats
}
