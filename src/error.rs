//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! ここに定義されるのは実行を中断する致命的な条件のみです。
//! 非致命的な条件（取得結果が0件、テーブル領域が見つからない等）は
//! エラーではなく[`crate::MergeReport`]で報告されます。

use std::path::PathBuf;
use thiserror::Error;

/// xlsxmergeクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `Io` / `Zip` / `Utf8` / `ParseInt`: コンテナの読み書き中の低レベルエラー
/// - `Parse`: 既存ワークブックの解析エラー（calamine由来）
/// - `Write`: ワークブックの書き出しエラー（rust_xlsxwriter由来）
/// - `Config`: ビルダー設定の検証に失敗したエラー
/// - `SourceUnavailable`: レコードソースへの接続・クエリ失敗（書き込み前に中断）
/// - `ContainerAbsent`: ベースファイルが存在せず、中断ポリシーが選択されている
/// - `SchemaMismatch`: 既存シートと受信バッチの列レイアウトが一致しない
/// - `SecurityViolation`: コンテナのサイズ・構造制限に違反した
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxmerge::XlsxMergeError;
/// use std::fs::File;
///
/// fn open_container(path: &str) -> Result<(), XlsxMergeError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxMergeError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 既存ワークブックの解析中に発生したエラー
    ///
    /// calamineクレートがワークブックを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// ワークブックの書き出し中に発生したエラー
    ///
    /// rust_xlsxwriterクレートがコンテナを生成する際に発生したエラーです。
    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// UTF-8文字列の変換エラー
    ///
    /// XML解析時にUTF-8文字列への変換に失敗した場合に発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    ///
    /// XLSXファイル（ZIPアーカイブ）の解析中に発生したエラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// 数値の解析エラー
    ///
    /// XML属性値から数値への変換に失敗した場合に発生します。
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 設定の検証に失敗したエラー
    ///
    /// `MergerBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、欠損コンテナのポリシーが未指定の場合や、
    /// キー列の指定が不正な場合などです。
    ///
    /// # 例
    ///
    /// ```rust
    /// use xlsxmerge::{MergerBuilder, XlsxMergeError};
    ///
    /// // 欠損コンテナのポリシーを指定しないとビルドできない
    /// let result = MergerBuilder::new().build();
    ///
    /// match result {
    ///     Err(XlsxMergeError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => panic!("expected Config error"),
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// レコードソースへの接続またはクエリ実行に失敗したエラー
    ///
    /// 致命的エラーです。ワークブックへの書き込みが行われる前に
    /// 実行全体が中断され、既存のコンテナは変更されません。
    #[error("Record source unavailable: {0}")]
    SourceUnavailable(String),

    /// ベースとなるワークブックコンテナが存在しないエラー
    ///
    /// 欠損コンテナのポリシーとして[`crate::AbsentPolicy::Abort`]が
    /// 選択されている場合にのみ発生します。既存の書式を失わないための
    /// 中断であり、コンテナは一切作成されません。
    #[error("Workbook container not found: {}", .path.display())]
    ContainerAbsent {
        /// 解決できなかったコンテナのパス
        path: PathBuf,
    },

    /// 既存シートと受信バッチの列レイアウトが一致しないエラー
    ///
    /// マージは列位置の一致を前提とするため、列数またはヘッダーラベルが
    /// 食い違う場合は黙って位置合わせを誤るのではなく、このエラーで
    /// 実行を中断します。
    #[error("Schema mismatch between existing sheet and incoming batch: {0}")]
    SchemaMismatch(String),

    /// コンテナの制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// 制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
