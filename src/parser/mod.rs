//! Parser Module
//!
//! XLSXファイルの解析を行うリーダー実装。
//! セル値はcalamineで、セル書式はXMLパーツから直接取得します。

mod metadata;
mod workbook;

pub(crate) use metadata::XlsxMetadataParser;
pub use workbook::WorkbookParser;
