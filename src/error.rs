//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxpdfクレート全体で使用するエラー型
///
/// Excelファイルの読み込み、グリッド抽出、PDF生成の各段階で発生する
/// エラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（出力ディレクトリ作成、ファイル書き込みなど）
/// - `Parse`: Excelファイルの解析中に発生したエラー（calamine由来）
/// - `NotFound`: 指定されたシートがワークブックに存在しない
/// - `EmptyWorkbook`: ワークブック自体が読めない、またはシートを含まない
/// - `Render`: PDFの組み立て・書き出しに失敗した
/// - `Config`: 設定の検証に失敗した
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::XlsxToPdfError;
/// use std::fs::File;
///
/// fn open_excel_file(path: &str) -> Result<(), XlsxToPdfError> {
///     let _file = File::open(path)?; // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxToPdfError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー
    ///
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー（XML属性の解析時）
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, XlsxToPdfError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_orientation_threshold(0) // 無効な閾値
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxToPdfError::Config(msg)) => println!("設定エラー: {}", msg),
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 指定されたシートが見つからない
    ///
    /// バッチ変換では、このエラーは該当シートの`ConversionResult`にのみ
    /// 記録され、他のシートの変換は継続されます。
    #[error("Sheet '{0}' not found")]
    NotFound(String),

    /// ワークブックが読めない、またはシートを1枚も含まない
    #[error("Workbook is empty or unreadable: {0}")]
    EmptyWorkbook(String),

    /// PDFの組み立て・書き出し中に発生したエラー
    #[error("Render error: {0}")]
    Render(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// 色指定文字列の解析エラー
///
/// 変換を中断するエラーではなく、スタイル解決時に警告として記録され、
/// 該当セルの背景色指定のみがスキップされます。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// 6桁（RGB）でも8桁（ARGB）でもない
    #[error("invalid color length {len} in '{value}' (expected 6 or 8 hex digits)")]
    InvalidLength { value: String, len: usize },

    /// 16進数以外の文字を含む
    #[error("invalid hex digit in color '{0}'")]
    InvalidDigit(String),
}
