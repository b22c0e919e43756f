//! Builder Module
//!
//! Fluent Builder APIを提供し、`Merger`インスタンスを段階的に構築する。
//! 設定は環境から暗黙に読まれることはなく、すべてこのビルダーを通じて
//! 明示的に渡される。

use std::path::Path;

use crate::api::{
    AbsentPolicy, KeySelector, MergeReport, RunStatus, TableOutcome, TableStylePreset,
};
use crate::error::XlsxMergeError;
use crate::merge::{self, MergeStats};
use crate::sheet::Sheet;
use crate::source::{DateWindow, RecordBatch, RecordSource};
use crate::style;
use crate::table;
use crate::workbook::{self, OpenLimits};

/// マージ実行の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct MergeConfig {
    /// 欠損コンテナの処理ポリシー（必須、デフォルトなし）
    pub absent_policy: Option<AbsentPolicy>,

    /// 重複排除キーの選択方式
    pub key_selector: KeySelector,

    /// 調整対象のテーブル領域名
    pub table_name: String,

    /// 領域が存在しない場合に新規登録するか
    pub create_table_if_missing: bool,

    /// 新規登録時のスタイルプリセット
    pub table_style: TableStylePreset,

    /// ブートストラップ時のシート名
    pub bootstrap_title: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            absent_policy: None,
            key_selector: KeySelector::default(),
            table_name: "MiTabla".to_string(),
            create_table_if_missing: false,
            table_style: TableStylePreset::default(),
            bootstrap_title: "Resultados".to_string(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Merger`インスタンスを段階的に構築するためのビルダーです。
/// 欠損コンテナのポリシーを除くすべての設定項目にデフォルト値が
/// 設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use xlsxmerge::{AbsentPolicy, KeySelector, MergerBuilder};
///
/// # fn main() -> Result<(), xlsxmerge::XlsxMergeError> {
/// let merger = MergerBuilder::new()
///     .with_absent_policy(AbsentPolicy::Bootstrap)
///     .with_key_selector(KeySelector::Column(1))
///     .with_table_name("Portes")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MergerBuilder {
    /// 内部設定（構築中）
    config: MergeConfig,
}

impl Default for MergerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MergerBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - キー選択: 先頭列（`KeySelector::Column(1)`）
    /// - テーブル領域名: `"MiTabla"`
    /// - 領域の新規登録: 無効
    /// - スタイルプリセット: `TableStyleMedium9`
    /// - ブートストラップ時のシート名: `"Resultados"`
    /// - 欠損コンテナのポリシー: **未設定**（`build()`前に必ず指定すること）
    pub fn new() -> Self {
        Self {
            config: MergeConfig::default(),
        }
    }

    /// 欠損コンテナの処理ポリシーを指定する
    ///
    /// ベースファイルが存在しない場合に中断するか、最小構成のシートを
    /// 合成して続行するかの選択です。運用ごとに意図が異なるため
    /// デフォルトは用意せず、指定がないと`build()`が失敗します。
    ///
    /// # 引数
    ///
    /// * `policy: AbsentPolicy`: 処理ポリシー
    pub fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.config.absent_policy = Some(policy);
        self
    }

    /// 重複排除キーの選択方式を指定する
    ///
    /// # 引数
    ///
    /// * `selector: KeySelector`: キー選択方式（列番号は1始まり）
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxmerge::{KeySelector, MergerBuilder};
    ///
    /// // 請求書コード列（3列目）をキーにする
    /// let builder = MergerBuilder::new()
    ///     .with_key_selector(KeySelector::Column(3));
    /// ```
    pub fn with_key_selector(mut self, selector: KeySelector) -> Self {
        self.config.key_selector = selector;
        self
    }

    /// 調整対象のテーブル領域名を指定する
    ///
    /// # 引数
    ///
    /// * `name`: 領域名（コンテナ内のdisplayName）
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.config.table_name = name.into();
        self
    }

    /// 領域が存在しない場合に新規登録するかを指定する
    ///
    /// # 引数
    ///
    /// * `create: bool`:
    ///   * `true`: 現在のデータ範囲で新規登録する
    ///   * `false`: 何もせず非致命的な条件として報告する（デフォルト）
    pub fn create_table_if_missing(mut self, create: bool) -> Self {
        self.config.create_table_if_missing = create;
        self
    }

    /// 新規登録されるテーブル領域のスタイルプリセットを指定する
    ///
    /// # 引数
    ///
    /// * `style: TableStylePreset`: スタイルプリセット
    pub fn with_table_style(mut self, style: TableStylePreset) -> Self {
        self.config.table_style = style;
        self
    }

    /// ブートストラップ時に合成するシートの名前を指定する
    ///
    /// # 引数
    ///
    /// * `title`: シート名
    pub fn with_bootstrap_title(mut self, title: impl Into<String>) -> Self {
        self.config.bootstrap_title = title.into();
        self
    }

    /// 設定を検証し、`Merger`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Merger)`: 設定が有効な場合
    /// * `Err(XlsxMergeError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * 欠損コンテナのポリシーが未指定
    /// * テーブル領域名またはシート名が空
    /// * キー列番号に0が含まれる、または複数列キーのリストが空
    pub fn build(self) -> Result<Merger, XlsxMergeError> {
        // 1. 欠損コンテナのポリシーの検証
        let Some(policy) = self.config.absent_policy else {
            return Err(XlsxMergeError::Config(
                "absent-container policy must be set explicitly (Abort or Bootstrap)".to_string(),
            ));
        };

        // 2. 名前の検証
        if self.config.table_name.is_empty() {
            return Err(XlsxMergeError::Config(
                "table name must not be empty".to_string(),
            ));
        }
        if self.config.bootstrap_title.is_empty() {
            return Err(XlsxMergeError::Config(
                "bootstrap sheet title must not be empty".to_string(),
            ));
        }

        // 3. キー選択方式の検証（列番号は1始まり）
        match &self.config.key_selector {
            KeySelector::Column(0) => {
                return Err(XlsxMergeError::Config(
                    "key column indexes are 1-based; 0 is not a valid column".to_string(),
                ));
            }
            KeySelector::Columns(cols) if cols.is_empty() => {
                return Err(XlsxMergeError::Config(
                    "composite key must name at least one column".to_string(),
                ));
            }
            KeySelector::Columns(cols) if cols.contains(&0) => {
                return Err(XlsxMergeError::Config(
                    "key column indexes are 1-based; 0 is not a valid column".to_string(),
                ));
            }
            _ => {}
        }

        // 4. Mergerインスタンス生成
        Ok(Merger::new(policy, self.config))
    }
}

/// マージ実行のファサード
///
/// 取得 -> 読み込み -> マージ -> 書式伝播 -> テーブル調整 -> 保存 の
/// 逐次パイプラインを実行するメインエントリーポイントです。
/// パイプラインは単一スレッドで順に実行され、途中で致命的エラーが
/// 発生した場合はコンテナに一切書き込みません。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxmerge::{AbsentPolicy, MergerBuilder, RecordBatch};
///
/// # fn main() -> Result<(), xlsxmerge::XlsxMergeError> {
/// let merger = MergerBuilder::new()
///     .with_absent_policy(AbsentPolicy::Bootstrap)
///     .build()?;
///
/// let batch: RecordBatch = serde_json::from_str(r#"{"header":[],"rows":[]}"#)
///     .expect("valid batch JSON");
/// let report = merger.run("Portes.xlsx", &batch)?;
/// println!("appended {} rows", report.appended);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Merger {
    /// 欠損コンテナの処理ポリシー
    policy: AbsentPolicy,

    /// マージ設定
    config: MergeConfig,

    /// コンテナ読み込み制限
    limits: OpenLimits,
}

impl Merger {
    pub(crate) fn new(policy: AbsentPolicy, config: MergeConfig) -> Self {
        Self {
            policy,
            config,
            limits: OpenLimits::default(),
        }
    }

    /// 取得済みのバッチをコンテナにマージする
    ///
    /// # 引数
    ///
    /// * `path` - ワークブックコンテナのパス
    /// * `batch` - 取得済みのレコードバッチ
    ///
    /// # 戻り値
    ///
    /// * `Ok(MergeReport)` - 実行が完了した場合（0件終了を含む）
    /// * `Err(XlsxMergeError)` - 致命的エラーが発生した場合。
    ///   コンテナへの書き込みは行われない
    ///
    /// # 処理フロー
    ///
    /// 1. バッチ形状の検証
    /// 2. 0件なら何もせず終了（コンテナは変更されない）
    /// 3. コンテナを開く（欠損時はポリシーに従う）
    /// 4. 列レイアウトの前提検証
    /// 5. マージ + 書式伝播 + テーブル領域調整
    /// 6. 原子的置換で保存
    pub fn run(
        &self,
        path: impl AsRef<Path>,
        batch: &RecordBatch,
    ) -> Result<MergeReport, XlsxMergeError> {
        let path = path.as_ref();

        // 1. バッチ形状の検証
        batch.validate()?;

        // 2. 取得結果が0件の場合はコンテナに触れない
        if batch.is_empty() {
            return Ok(MergeReport::no_results());
        }

        // 3. コンテナを開く（欠損時はポリシーに従う）
        let (mut sheet, bootstrapped) = match workbook::open_container(path, &self.limits)? {
            Some(sheet) => (sheet, false),
            None => match self.policy {
                AbsentPolicy::Abort => {
                    return Err(XlsxMergeError::ContainerAbsent {
                        path: path.to_path_buf(),
                    });
                }
                AbsentPolicy::Bootstrap => (
                    Sheet::bootstrap(&self.config.bootstrap_title, batch.header.clone()),
                    true,
                ),
            },
        };

        // 4-5. マージ + 書式伝播 + テーブル領域調整
        let (stats, table) = self.merge_into(&mut sheet, batch)?;

        // 6. 保存（原子的置換）
        workbook::save_container(path, &sheet)?;

        Ok(MergeReport {
            status: RunStatus::Merged,
            fetched: batch.len(),
            appended: stats.appended_rows.len(),
            skipped_existing: stats.skipped_existing,
            skipped_within_batch: stats.skipped_within_batch,
            bootstrapped,
            table,
        })
    }

    /// ソースから取得してコンテナにマージする
    ///
    /// [`Merger::run`]の前段に取得を挟んだ便宜メソッドです。
    /// 取得の失敗（[`XlsxMergeError::SourceUnavailable`]）は
    /// コンテナに触れる前に実行全体を中断します。
    pub fn run_with_source(
        &self,
        path: impl AsRef<Path>,
        source: &mut dyn RecordSource,
        window: &DateWindow,
    ) -> Result<MergeReport, XlsxMergeError> {
        let batch = source.fetch(window)?;
        self.run(path, &batch)
    }

    /// メモリ上のシートにバッチをマージする
    ///
    /// コンテナの読み書きを伴わない、マージ処理の中核です。
    /// 列レイアウトの検証、マージ、追記行への書式伝播、テーブル領域の
    /// 調整までを行います。
    ///
    /// # 戻り値
    ///
    /// * `Ok((MergeStats, TableOutcome))` - マージ統計と領域調整の結果
    /// * `Err(XlsxMergeError::SchemaMismatch)` - 列レイアウトが一致しない場合
    pub fn merge_into(
        &self,
        sheet: &mut Sheet,
        batch: &RecordBatch,
    ) -> Result<(MergeStats, TableOutcome), XlsxMergeError> {
        batch.validate()?;
        self.check_schema(sheet, batch)?;

        // マージ（行の追記のみ。書式・テーブル領域には触れない）
        let stats = merge::merge(sheet, batch, &self.config.key_selector);

        // 追記された行へ、直前行の書式を追記順に伝播する
        for &row_index in &stats.appended_rows {
            style::propagate_row_style(sheet, row_index);
        }

        // テーブル領域の境界を現在のデータ範囲に合わせる
        let table = table::reconcile(
            sheet,
            &self.config.table_name,
            self.config.create_table_if_missing,
            self.config.table_style,
        );

        Ok((stats, table))
    }

    /// 列レイアウトの前提を検証する（プライベート）
    ///
    /// マージは列位置の一致を前提とするため、列数とヘッダーラベルの
    /// 両方が一致しない場合は実行を中断します。
    fn check_schema(&self, sheet: &Sheet, batch: &RecordBatch) -> Result<(), XlsxMergeError> {
        if sheet.header.len() != batch.header.len() {
            return Err(XlsxMergeError::SchemaMismatch(format!(
                "existing sheet has {} columns, incoming batch has {}",
                sheet.header.len(),
                batch.header.len()
            )));
        }
        for (i, (sheet_label, batch_label)) in
            sheet.header.iter().zip(batch.header.iter()).enumerate()
        {
            if sheet_label != batch_label {
                return Err(XlsxMergeError::SchemaMismatch(format!(
                    "column {} is labeled '{}' in the sheet but '{}' in the batch",
                    i + 1,
                    sheet_label,
                    batch_label
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn header() -> Vec<String> {
        vec!["ID".to_string(), "NAME".to_string()]
    }

    fn batch(rows: Vec<Vec<CellValue>>) -> RecordBatch {
        RecordBatch::new(header(), rows)
    }

    fn record(id: f64, name: &str) -> Vec<CellValue> {
        vec![CellValue::Number(id), CellValue::String(name.to_string())]
    }

    #[test]
    fn test_builder_defaults() {
        let builder = MergerBuilder::new();
        assert_eq!(builder.config.absent_policy, None);
        assert_eq!(builder.config.key_selector, KeySelector::Column(1));
        assert_eq!(builder.config.table_name, "MiTabla");
        assert!(!builder.config.create_table_if_missing);
        assert_eq!(builder.config.bootstrap_title, "Resultados");
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Abort)
            .with_key_selector(KeySelector::Column(3))
            .with_table_name("Portes")
            .create_table_if_missing(true)
            .with_table_style(TableStylePreset::Light(2))
            .with_bootstrap_title("Hoja1");

        assert_eq!(builder.config.absent_policy, Some(AbsentPolicy::Abort));
        assert_eq!(builder.config.key_selector, KeySelector::Column(3));
        assert_eq!(builder.config.table_name, "Portes");
        assert!(builder.config.create_table_if_missing);
        assert_eq!(builder.config.table_style, TableStylePreset::Light(2));
        assert_eq!(builder.config.bootstrap_title, "Hoja1");
    }

    #[test]
    fn test_build_requires_absent_policy() {
        let result = MergerBuilder::new().build();
        match result {
            Err(XlsxMergeError::Config(msg)) => {
                assert!(msg.contains("absent-container policy"));
            }
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_rejects_empty_table_name() {
        let result = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .with_table_name("")
            .build();
        assert!(matches!(result, Err(XlsxMergeError::Config(_))));
    }

    #[test]
    fn test_build_rejects_zero_key_column() {
        let result = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .with_key_selector(KeySelector::Column(0))
            .build();
        assert!(matches!(result, Err(XlsxMergeError::Config(_))));

        let result = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .with_key_selector(KeySelector::Columns(vec![1, 0]))
            .build();
        assert!(matches!(result, Err(XlsxMergeError::Config(_))));
    }

    #[test]
    fn test_build_rejects_empty_composite_key() {
        let result = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .with_key_selector(KeySelector::Columns(vec![]))
            .build();
        assert!(matches!(result, Err(XlsxMergeError::Config(_))));
    }

    #[test]
    fn test_run_with_empty_batch_reports_no_results() {
        let merger = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Abort)
            .build()
            .unwrap();

        // コンテナが存在しなくても、0件ならポリシー以前に何もしない
        let report = merger
            .run("definitely/missing/Portes.xlsx", &batch(vec![]))
            .unwrap();
        assert_eq!(report.status, RunStatus::NoResults);
        assert_eq!(report.appended, 0);
    }

    #[test]
    fn test_run_abort_policy_on_missing_container() {
        let merger = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Abort)
            .build()
            .unwrap();

        let result = merger.run(
            "definitely/missing/Portes.xlsx",
            &batch(vec![record(1.0, "a")]),
        );
        assert!(matches!(
            result,
            Err(XlsxMergeError::ContainerAbsent { .. })
        ));
    }

    #[test]
    fn test_merge_into_full_pipeline_in_memory() {
        let merger = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .with_table_name("Portes")
            .create_table_if_missing(true)
            .build()
            .unwrap();

        let mut sheet = Sheet::bootstrap("Resultados", header());
        let incoming = batch(vec![
            record(101.0, "a"),
            record(102.0, "b"),
            record(101.0, "dup"),
        ]);

        let (stats, table) = merger.merge_into(&mut sheet, &incoming).unwrap();

        assert_eq!(stats.appended_rows, vec![2, 3]);
        assert_eq!(stats.skipped_within_batch, 1);
        assert_eq!(table, TableOutcome::Created("A1:B3".to_string()));

        // 2回目は何も追加されず、テーブル範囲も変わらない
        let (stats2, table2) = merger.merge_into(&mut sheet, &incoming).unwrap();
        assert!(stats2.appended_rows.is_empty());
        assert_eq!(table2, TableOutcome::Updated("A1:B3".to_string()));
    }

    #[test]
    fn test_merge_into_rejects_schema_mismatch() {
        let merger = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .build()
            .unwrap();

        let mut sheet = Sheet::bootstrap("Resultados", header());

        // 列数の不一致
        let narrow = RecordBatch::new(
            vec!["ID".to_string()],
            vec![vec![CellValue::Number(1.0)]],
        );
        assert!(matches!(
            merger.merge_into(&mut sheet, &narrow),
            Err(XlsxMergeError::SchemaMismatch(_))
        ));

        // ラベルの不一致
        let relabeled = RecordBatch::new(
            vec!["ID".to_string(), "CLIENTE".to_string()],
            vec![record(1.0, "a")],
        );
        assert!(matches!(
            merger.merge_into(&mut sheet, &relabeled),
            Err(XlsxMergeError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_merge_into_propagates_styles_to_appended_rows() {
        use crate::style::{CellStyle, FillStyle};

        let merger = MergerBuilder::new()
            .with_absent_policy(AbsentPolicy::Bootstrap)
            .build()
            .unwrap();

        let mut sheet = Sheet::bootstrap("Resultados", header());
        sheet.append_record(record(1.0, "seed"));
        let seeded = CellStyle {
            fill: FillStyle {
                solid_color: Some("FF00FF00".to_string()),
            },
            ..CellStyle::default()
        };
        sheet.rows[0].styles = vec![Some(seeded.clone()), Some(seeded.clone())];

        let incoming = batch(vec![record(2.0, "x"), record(3.0, "y")]);
        merger.merge_into(&mut sheet, &incoming).unwrap();

        // 追記された2行とも、直前行の書式を値コピーで引き継ぐ
        assert_eq!(sheet.rows[1].styles[0], Some(seeded.clone()));
        assert_eq!(sheet.rows[2].styles[1], Some(seeded));
    }
}
