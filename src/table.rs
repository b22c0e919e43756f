//! Table Region Module
//!
//! シート上の名前付きテーブル領域と、マージ後の境界調整を実装するモジュール。
//! BIツール等のコンシューマは、この領域を構造化データテーブルとして認識する。

use crate::api::{TableOutcome, TableStylePreset};
use crate::sheet::Sheet;
use crate::types::{CellCoord, CellRange};

/// 名前付きテーブル領域
///
/// シート上の矩形範囲に名前と視覚スタイルプリセットを付けたものです。
/// 1回の実行で調整されるのは設定された名前の領域1つだけで、
/// 他の領域が存在しても変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    /// 領域名（コンテナ内のdisplayName）
    pub name: String,

    /// 領域の矩形範囲
    pub range: CellRange,

    /// 視覚スタイルプリセット
    pub style: TableStylePreset,
}

/// テーブル領域の境界をシートの現在のデータ範囲に合わせる
///
/// シートの占有範囲（左上 = ヘッダーのA1固定、右下 = 最終行×最終列）を
/// 再計算し、設定された名前の領域の範囲を更新します。
///
/// # 引数
///
/// * `sheet` - 対象シート（全行の追記が済んでいること）
/// * `table_name` - 調整対象の領域名
/// * `create_if_missing` - 領域が存在しない場合に新規登録するか
/// * `default_style` - 新規登録時に付与するスタイルプリセット
///
/// # 動作
///
/// * 領域が存在する場合: 範囲を`A1:<最終列><最終行>`に更新します。
///   行は追記されるだけで削除されないため、範囲が縮むことはありません。
/// * 存在せず`create_if_missing`が真の場合: 現在の全範囲で新規登録します。
///   ただしデータ行が1行もない場合は登録できません（ヘッダーだけの
///   テーブルは不正なため）。
/// * 存在せず`create_if_missing`が偽の場合: 何もせず
///   [`TableOutcome::Missing`]を返します（非致命。データと書式は
///   そのまま保存されます）。
///
/// # 冪等性
///
/// 行の変更を挟まずに2回呼び出しても、同じ範囲が得られます。
pub(crate) fn reconcile(
    sheet: &mut Sheet,
    table_name: &str,
    create_if_missing: bool,
    default_style: TableStylePreset,
) -> TableOutcome {
    let extent = CellRange::new(
        CellCoord::new(1, 1),
        CellCoord::new(sheet.last_row(), sheet.last_col()),
    );

    if let Some(region) = sheet.table_mut(table_name) {
        region.range = extent;
        return TableOutcome::Updated(extent.to_ref());
    }

    if create_if_missing && sheet.last_row() >= 2 {
        sheet.tables.push(TableRegion {
            name: table_name.to_string(),
            range: extent,
            style: default_style,
        });
        return TableOutcome::Created(extent.to_ref());
    }

    TableOutcome::Missing
}
