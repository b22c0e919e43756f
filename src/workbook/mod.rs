//! Workbook Accessor Module
//!
//! ワークブックコンテナ（XLSXファイル）の読み書き境界を提供するモジュール。
//! コアのマージ処理はメモリ上の[`crate::Sheet`]に対して行われ、
//! このモジュールが提供するのは`open`（パス -> シートまたは欠損）と
//! `save`（シート -> パス）の2操作だけである。
//!
//! 読み込みはcalamine（セル値）とXMLメタデータ解析（書式・テーブル定義）の
//! 組み合わせ、書き出しはrust_xlsxwriterで行う。

pub(crate) mod metadata;
pub(crate) mod reader;
pub(crate) mod writer;

pub(crate) use reader::open_container;
pub(crate) use writer::save_container;

/// コンテナ読み込み時の制限
///
/// ZIP bomb等の異常なコンテナを開いてしまわないための上限値です。
#[derive(Debug, Clone)]
pub(crate) struct OpenLimits {
    /// コンテナファイル自体の最大サイズ（バイト）
    /// デフォルト: 256MB
    pub max_container_size: u64,

    /// アーカイブ内の最大パート数
    /// デフォルト: 10000
    pub max_part_count: usize,

    /// 単一パートの最大サイズ（バイト）
    /// デフォルト: 100MB
    pub max_part_size: u64,
}

impl Default for OpenLimits {
    fn default() -> Self {
        Self {
            max_container_size: 268_435_456, // 256MB
            max_part_count: 10_000,
            max_part_size: 104_857_600, // 100MB
        }
    }
}

/// アーカイブ内パートのパスを検証する
///
/// パストラバーサル攻撃を防ぐため、絶対パス・`..`・バックスラッシュを
/// 含むパスを拒否します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（理由を含むメッセージ）
pub(crate) fn validate_part_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty part path is not allowed".to_string());
    }
    if path.starts_with('/') || path.chars().nth(1) == Some(':') {
        return Err(format!("Absolute part path is not allowed: {}", path));
    }
    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }
    if path.contains('\\') {
        return Err(format!("Backslash in part path is not allowed: {}", path));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = OpenLimits::default();
        assert_eq!(limits.max_container_size, 268_435_456);
        assert_eq!(limits.max_part_count, 10_000);
        assert_eq!(limits.max_part_size, 104_857_600);
    }

    #[test]
    fn test_validate_part_path_valid() {
        assert!(validate_part_path("xl/workbook.xml").is_ok());
        assert!(validate_part_path("xl/worksheets/sheet1.xml").is_ok());
        assert!(validate_part_path("xl/tables/table1.xml").is_ok());
        assert!(validate_part_path("xl/styles.xml").is_ok());
    }

    #[test]
    fn test_validate_part_path_rejects_empty() {
        assert!(validate_part_path("").is_err());
    }

    #[test]
    fn test_validate_part_path_rejects_absolute() {
        assert!(validate_part_path("/etc/passwd").is_err());
        assert!(validate_part_path("C:\\Windows\\system32").is_err());
    }

    #[test]
    fn test_validate_part_path_rejects_traversal() {
        assert!(validate_part_path("../etc/passwd").is_err());
        assert!(validate_part_path("xl/../../etc/passwd").is_err());
    }

    #[test]
    fn test_validate_part_path_rejects_backslash() {
        assert!(validate_part_path("xl\\workbook.xml").is_err());
    }
}
