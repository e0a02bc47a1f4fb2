//! Grid Provider Module
//!
//! 変換パイプラインが依存するリーダーの抽象化（`GridProvider`）と、
//! メモリ上のデータから構築するプロバイダー（`MemoryWorkbook`）を提供します。

use crate::error::XlsxToPdfError;
use crate::grid::Grid;
use crate::types::FormatMap;

/// シートのセルデータと書式情報を提供するリーダーの抽象化
///
/// 変換パイプラインはこのトレイトのみに依存し、ファイル形式の解析は
/// 実装側（`WorkbookParser`など）が担当します。
pub trait GridProvider {
    /// ワークブック内のシート名を順序どおりに取得
    fn sheet_names(&self) -> Vec<String>;

    /// シートのセルデータを稠密なグリッドとして取得
    ///
    /// シートが存在しない場合は`XlsxToPdfError::NotFound`を返します。
    fn get_cells(&mut self, sheet_name: &str) -> Result<Grid, XlsxToPdfError>;

    /// シートの書式情報を取得
    ///
    /// シートが存在しない場合は`XlsxToPdfError::NotFound`を返します。
    fn get_formatting(&mut self, sheet_name: &str) -> Result<FormatMap, XlsxToPdfError>;
}

/// メモリ上のシート
#[derive(Debug, Clone)]
struct MemorySheet {
    name: String,
    grid: Grid,
    formatting: FormatMap,
}

/// メモリ上のデータから構築するワークブック
///
/// 別の手段で解析済みのデータを変換する場合や、テストで使用します。
///
/// # 使用例
///
/// ```rust
/// use xlsxpdf::{Grid, GridProvider, MemoryWorkbook};
///
/// let mut workbook = MemoryWorkbook::new();
/// workbook.add_sheet("Sheet1", Grid::from_strings(vec![vec!["ID", "Name"], vec!["1", "Alice"]]));
///
/// assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
/// let grid = workbook.get_cells("Sheet1").unwrap();
/// assert_eq!(grid.row_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    /// 空のワークブックを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 書式情報なしでシートを追加
    pub fn add_sheet(&mut self, name: impl Into<String>, grid: Grid) -> &mut Self {
        self.add_sheet_with_formatting(name, grid, FormatMap::new())
    }

    /// 書式情報付きでシートを追加
    ///
    /// 同名のシートが既に存在する場合は置き換えます。
    pub fn add_sheet_with_formatting(
        &mut self,
        name: impl Into<String>,
        grid: Grid,
        formatting: FormatMap,
    ) -> &mut Self {
        let name = name.into();
        let sheet = MemorySheet {
            name: name.clone(),
            grid,
            formatting,
        };
        match self.sheets.iter_mut().find(|s| s.name == name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
        self
    }

    fn sheet(&self, sheet_name: &str) -> Result<&MemorySheet, XlsxToPdfError> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet_name)
            .ok_or_else(|| XlsxToPdfError::NotFound(sheet_name.to_string()))
    }
}

impl GridProvider for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn get_cells(&mut self, sheet_name: &str) -> Result<Grid, XlsxToPdfError> {
        Ok(self.sheet(sheet_name)?.grid.clone())
    }

    fn get_formatting(&mut self, sheet_name: &str) -> Result<FormatMap, XlsxToPdfError> {
        Ok(self.sheet(sheet_name)?.formatting.clone())
    }
}
