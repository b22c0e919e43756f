//! Public API Types
//!
//! 公開APIで使用する設定用列挙型と実行レポート型を定義するモジュール。

/// ベースコンテナが存在しない場合の処理ポリシー
///
/// 実行開始時にワークブックのパスが既存ファイルに解決できなかった場合の
/// 動作を指定します。どちらを選ぶかは運用判断であり、デフォルトは
/// 存在しません（`MergerBuilder::build()`で必ず明示する必要があります）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AbsentPolicy {
    /// 実行を中断する
    ///
    /// 既存ファイルに蓄積された書式・テーブル定義を失うリスクを避けるため、
    /// 何も書き込まずに[`crate::XlsxMergeError::ContainerAbsent`]で失敗します。
    Abort,

    /// 最小構成のシートを新規作成して続行する
    ///
    /// ヘッダー行（太字）だけを持つシートを合成し、そこへマージします。
    /// 既存ファイルの書式を再現することはできません。
    Bootstrap,
}

/// 重複排除キーの選択方式
///
/// 各行からキー値を取り出す方法を指定します。列番号は1始まり
/// （列A = 1）です。キーセルが空の行はどの既存行とも一致しないものとして
/// 常に追記されます。
///
/// # 使用例
///
/// ```rust
/// use xlsxmerge::KeySelector;
///
/// // 先頭列（請求書ID等）をキーにする
/// let by_id = KeySelector::Column(1);
///
/// // 複数列の組をキーにする
/// let by_pair = KeySelector::Columns(vec![1, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeySelector {
    /// 単一列の値をキーにする（1始まりの列番号）
    Column(u32),

    /// 複数列の値の組をキーにする（1始まりの列番号のリスト）
    ///
    /// いずれかの構成列が空の場合、キー全体が空として扱われます。
    Columns(Vec<u32>),
}

impl Default for KeySelector {
    /// デフォルトは先頭列
    fn default() -> Self {
        KeySelector::Column(1)
    }
}

/// テーブル領域の視覚スタイルプリセット
///
/// Excelの組み込みテーブルスタイル（`TableStyleMedium9`等）に対応します。
/// 新規作成されるテーブル領域に付与されるほか、既存コンテナから
/// 読み込んだ領域のスタイル名の解析にも使用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableStylePreset {
    /// スタイルなし
    None,

    /// Lightスタイル（1〜21）
    Light(u8),

    /// Mediumスタイル（1〜28）
    Medium(u8),

    /// Darkスタイル（1〜11）
    Dark(u8),
}

impl TableStylePreset {
    /// コンテナ内で使用されるスタイル名を返す（例: "TableStyleMedium9"）
    pub fn style_name(&self) -> String {
        match self {
            TableStylePreset::None => "TableStyleNone".to_string(),
            TableStylePreset::Light(n) => format!("TableStyleLight{}", n),
            TableStylePreset::Medium(n) => format!("TableStyleMedium{}", n),
            TableStylePreset::Dark(n) => format!("TableStyleDark{}", n),
        }
    }

    /// スタイル名からプリセットを解析する
    ///
    /// # 戻り値
    ///
    /// * `Some(TableStylePreset)` - 既知の形式の場合
    /// * `None` - 解析できない名前の場合
    pub fn from_style_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("TableStyle")?;
        if rest == "None" {
            return Some(TableStylePreset::None);
        }
        for (prefix, ctor) in [
            ("Light", TableStylePreset::Light as fn(u8) -> TableStylePreset),
            ("Medium", TableStylePreset::Medium as fn(u8) -> TableStylePreset),
            ("Dark", TableStylePreset::Dark as fn(u8) -> TableStylePreset),
        ] {
            if let Some(num) = rest.strip_prefix(prefix) {
                return num.parse::<u8>().ok().map(ctor);
            }
        }
        None
    }
}

impl Default for TableStylePreset {
    /// デフォルトはMedium 9（Excelのテーブル既定スタイル）
    fn default() -> Self {
        TableStylePreset::Medium(9)
    }
}

/// 実行の終了状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunStatus {
    /// マージが実行され、コンテナが保存された
    Merged,

    /// 取得結果が0件だったため、コンテナに触れずに終了した（非致命）
    NoResults,
}

/// テーブル領域の調整結果
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableOutcome {
    /// 既存の領域の範囲を更新した（新しい範囲参照を保持）
    Updated(String),

    /// 領域が存在しなかったため新規登録した（登録した範囲参照を保持）
    Created(String),

    /// 領域が見つからず、作成も無効だった（非致命。データと書式は保存済み）
    Missing,

    /// 調整を行わなかった（取得結果が0件の実行など）
    NotAttempted,
}

/// 1回の実行の結果レポート
///
/// 非致命的な条件（取得結果0件、テーブル領域の欠落）はエラーではなく
/// このレポートで報告されます。呼び出し側はログ出力や監視への転送に
/// 利用できます。
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// 実行の終了状態
    pub status: RunStatus,

    /// ソースから取得したレコード数
    pub fetched: usize,

    /// シートに追記されたレコード数
    pub appended: usize,

    /// 既存行とキーが一致したためスキップされたレコード数
    pub skipped_existing: usize,

    /// バッチ内重複（2件目以降）としてスキップされたレコード数
    pub skipped_within_batch: usize,

    /// コンテナが存在せず、新規シートを合成したかどうか
    pub bootstrapped: bool,

    /// テーブル領域の調整結果
    pub table: TableOutcome,
}

impl MergeReport {
    /// 取得結果が0件だった実行のレポートを生成
    pub(crate) fn no_results() -> Self {
        Self {
            status: RunStatus::NoResults,
            fetched: 0,
            appended: 0,
            skipped_existing: 0,
            skipped_within_batch: 0,
            bootstrapped: false,
            table: TableOutcome::NotAttempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_selector_default() {
        assert_eq!(KeySelector::default(), KeySelector::Column(1));
    }

    #[test]
    fn test_table_style_preset_names() {
        assert_eq!(
            TableStylePreset::Medium(9).style_name(),
            "TableStyleMedium9"
        );
        assert_eq!(TableStylePreset::Light(1).style_name(), "TableStyleLight1");
        assert_eq!(TableStylePreset::Dark(11).style_name(), "TableStyleDark11");
    }

    #[test]
    fn test_table_style_preset_parse() {
        assert_eq!(
            TableStylePreset::from_style_name("TableStyleMedium9"),
            Some(TableStylePreset::Medium(9))
        );
        assert_eq!(
            TableStylePreset::from_style_name("TableStyleLight21"),
            Some(TableStylePreset::Light(21))
        );
        assert_eq!(TableStylePreset::from_style_name("PivotStyle1"), None);
        assert_eq!(TableStylePreset::from_style_name("TableStyleMediumX"), None);
    }

    #[test]
    fn test_table_style_preset_round_trip() {
        for preset in [
            TableStylePreset::Medium(9),
            TableStylePreset::Light(3),
            TableStylePreset::Dark(2),
            TableStylePreset::None,
        ] {
            assert_eq!(
                TableStylePreset::from_style_name(&preset.style_name()),
                Some(preset)
            );
        }
    }

    #[test]
    fn test_no_results_report() {
        let report = MergeReport::no_results();
        assert_eq!(report.status, RunStatus::NoResults);
        assert_eq!(report.fetched, 0);
        assert_eq!(report.appended, 0);
        assert_eq!(report.table, TableOutcome::NotAttempted);
    }
}
