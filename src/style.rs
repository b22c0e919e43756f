//! Style Module
//!
//! セル1個に付与される視覚書式バンドル（フォント・塗りつぶし・罫線・配置）と、
//! 追記行への書式伝播を実装するモジュール。
//!
//! バンドルは常に値としてコピーされます（`Clone`）。コピー元とコピー先が
//! 同じオブジェクトを共有することはなく、一方の変更が他方に波及しません。

use crate::sheet::Sheet;

/// フォント書式
///
/// 色は`"FFRRGGBB"`形式（ARGB16進、コンテナ内の表現と同じ）で保持します。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontStyle {
    /// フォント名（例: "Calibri"）
    pub name: Option<String>,

    /// フォントサイズ（ポイント）
    pub size: Option<f64>,

    /// 太字
    pub bold: bool,

    /// 斜体
    pub italic: bool,

    /// 文字色（ARGB16進）
    pub color: Option<String>,
}

/// 塗りつぶし書式
///
/// 単色パターン塗りつぶしのみを扱います。グラデーション等は保持しません。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FillStyle {
    /// 前景色（ARGB16進）。`None`は塗りつぶしなし
    pub solid_color: Option<String>,
}

/// 罫線書式
///
/// 各辺の線種をコンテナ内の名前（"thin", "medium", "thick"等）で保持します。
/// `None`は罫線なし。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BorderStyle {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl BorderStyle {
    /// いずれかの辺に罫線があるかを判定
    pub fn is_any(&self) -> bool {
        self.top.is_some() || self.bottom.is_some() || self.left.is_some() || self.right.is_some()
    }
}

/// 配置書式
///
/// 水平・垂直方向の配置をコンテナ内の名前（"center", "top"等）で保持します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignStyle {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
}

/// セル1個の視覚書式バンドル
///
/// ワークブックから読み込まれた書式、および追記行へ伝播される書式の
/// 単位です。バンドル間の共有は行わず、伝播は常に`clone()`による
/// 値コピーで行われます。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: AlignStyle,
}

impl CellStyle {
    /// 太字フォントのみのバンドルを生成
    ///
    /// 新規作成されるシートのヘッダー行に使用します。
    pub fn bold() -> Self {
        Self {
            font: FontStyle {
                bold: true,
                ..FontStyle::default()
            },
            ..Self::default()
        }
    }

    /// デフォルト以外の書式を1つも持たないかを判定
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// 追記された行に直前行の書式を伝播する
///
/// 指定された行の各列について、1つ上の行のセル書式バンドルを
/// 値コピーします。伝播後、新しい行は直前行と視覚的に区別できなく
/// なります。
///
/// # 引数
///
/// * `sheet` - 対象シート
/// * `new_row_index` - 追記直後の行番号（1始まり、シート表記）
///
/// # 動作
///
/// * `new_row_index <= 2`（先頭データ行、上にヘッダーしかない）の場合は
///   何もしません。直前行がヘッダーのみの場合に書式を引き継がないのは
///   意図した挙動です（さらに上の行を遡ることはしません）。
/// * 直前行の書式が付与されていない列は、新しい行でも書式なしになります。
pub(crate) fn propagate_row_style(sheet: &mut Sheet, new_row_index: u32) {
    if new_row_index <= 2 {
        return;
    }

    // シート行番号 -> データ行インデックス（行2 = インデックス0）
    let new_idx = (new_row_index - 2) as usize;
    let prev_idx = new_idx - 1;
    if new_idx >= sheet.rows.len() {
        return;
    }

    let col_count = sheet.last_col() as usize;

    // 値コピー。clone()により書式オブジェクトの共有は発生しない
    let mut styles = sheet.rows[prev_idx].styles.clone();
    styles.resize(col_count, None);
    sheet.rows[new_idx].styles = styles;
}
