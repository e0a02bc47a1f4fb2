//! Workbook Parser Module
//!
//! calamineを使用してXLSXファイルからセルデータを抽出し、
//! `GridProvider`として変換パイプラインに提供します。

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use zip::ZipArchive;

use crate::error::XlsxToPdfError;
use crate::formatter::CellFormatter;
use crate::grid::Grid;
use crate::parser::XlsxMetadataParser;
use crate::provider::GridProvider;
use crate::security::SecurityConfig;
use crate::types::{CellCoord, CellValue, FormatMap};

/// XLSXワークブックパーサー
///
/// calamineのラッパーとして、セル値の抽出を行います。
/// セル書式は`XlsxMetadataParser`がXMLから直接取得します。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::{GridProvider, WorkbookParser};
///
/// let mut parser = WorkbookParser::open_path("input.xlsx")?;
/// for name in parser.sheet_names() {
///     let grid = parser.get_cells(&name)?;
///     println!("{}: {} rows", name, grid.row_count());
/// }
/// # Ok::<(), xlsxpdf::XlsxToPdfError>(())
/// ```
pub struct WorkbookParser {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<Vec<u8>>>,
    /// XMLメタデータパーサー
    metadata: XlsxMetadataParser,
    formatter: CellFormatter,
    sheet_names: Vec<String>,
}

impl WorkbookParser {
    /// ファイルパスからワークブックを開く
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, XlsxToPdfError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        SecurityConfig::default().check_input_size(file.metadata()?.len())?;
        Self::open(file)
    }

    /// リーダーからワークブックを開く
    ///
    /// 入力全体をメモリに読み込みます（`SecurityConfig`の上限まで）。
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(XlsxToPdfError::SecurityViolation)` - 入力サイズやZIPの内容が制限を超えた場合
    /// * `Err(XlsxToPdfError::Zip)` / `Err(XlsxToPdfError::Parse)` - XLSXとして読めない場合
    /// * `Err(XlsxToPdfError::EmptyWorkbook)` - シートを1枚も含まない場合
    pub fn open<R: Read>(reader: R) -> Result<Self, XlsxToPdfError> {
        let security_config = SecurityConfig::default();

        let mut buffer = Vec::new();
        reader
            .take(security_config.max_input_file_size.saturating_add(1))
            .read_to_end(&mut buffer)?;
        security_config.check_input_size(buffer.len() as u64)?;

        Self::from_bytes_with_config(buffer, &security_config)
    }

    /// XLSXファイルのバイト列からワークブックを開く
    pub fn from_bytes(buffer: Vec<u8>) -> Result<Self, XlsxToPdfError> {
        let security_config = SecurityConfig::default();
        security_config.check_input_size(buffer.len() as u64)?;
        Self::from_bytes_with_config(buffer, &security_config)
    }

    pub(crate) fn from_bytes_with_config(
        buffer: Vec<u8>,
        security_config: &SecurityConfig,
    ) -> Result<Self, XlsxToPdfError> {
        {
            let mut archive = ZipArchive::new(Cursor::new(buffer.as_slice()))
                .map_err(|e| XlsxToPdfError::Zip(format!("{}", e)))?;
            security_config.check_archive(&mut archive)?;
        }

        let sheets = open_workbook_auto_from_rs(Cursor::new(buffer.clone()))
            .map_err(XlsxToPdfError::Parse)?;
        let workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(XlsxToPdfError::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(XlsxToPdfError::EmptyWorkbook(
                "workbook contains no sheets".to_string(),
            ));
        }

        let metadata = XlsxMetadataParser::new(buffer)?;
        log::debug!(
            "opened workbook with {} sheet(s), date1904={}",
            sheet_names.len(),
            metadata.is_1904()
        );

        Ok(Self {
            workbook,
            metadata,
            formatter: CellFormatter::new(),
            sheet_names,
        })
    }

    /// 1904年エポックを使用するかどうか
    pub fn is_1904(&self) -> bool {
        self.metadata.is_1904()
    }

    fn ensure_sheet(&self, sheet_name: &str) -> Result<(), XlsxToPdfError> {
        if self.sheet_names.iter().any(|name| name == sheet_name) {
            Ok(())
        } else {
            Err(XlsxToPdfError::NotFound(sheet_name.to_string()))
        }
    }
}

/// calamineのセル値を内部表現に変換
fn convert_data(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::DateTimeIso(s.clone()),
        Data::Empty => CellValue::Empty,
    }
}

impl GridProvider for WorkbookParser {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    /// シートのセル値を抽出
    ///
    /// calamineの範囲は最初の値を持つセルから始まるため、開始位置のオフセットを
    /// 加算してA1起点のグリッドを構築します。
    fn get_cells(&mut self, sheet_name: &str) -> Result<Grid, XlsxToPdfError> {
        self.ensure_sheet(sheet_name)?;

        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxToPdfError::Parse(e.into()))?;

        let Some((start_row, start_col)) = range.start() else {
            return Ok(Grid::default());
        };
        let (height, width) = range.get_size();
        let rows = start_row as usize + height;
        let cols = start_col as usize + width;

        let is_1904 = self.metadata.is_1904();
        let mut cells = Vec::new();
        for (row, col, data) in range.used_cells() {
            let value = convert_data(data);
            if value.is_empty() {
                continue;
            }
            if let Some(text) = self.formatter.format_cell(&value, is_1904)? {
                let coord = CellCoord::new(start_row + row as u32, start_col + col as u32);
                cells.push((coord, text));
            }
        }

        log::debug!(
            "sheet '{}': extracted {} non-empty cells in {}x{} grid",
            sheet_name,
            cells.len(),
            rows,
            cols
        );
        Ok(Grid::from_sparse(rows, cols, cells))
    }

    fn get_formatting(&mut self, sheet_name: &str) -> Result<FormatMap, XlsxToPdfError> {
        self.ensure_sheet(sheet_name)?;
        self.metadata.sheet_formats(sheet_name)
    }
}
