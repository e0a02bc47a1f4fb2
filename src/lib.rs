//! xlsxpdf - Pure-Rust Excel to PDF table converter
//!
//! This crate reads spreadsheet cell data (values and formatting) and lays it out
//! into paginated PDF tables: trailing empty regions are trimmed, the page
//! orientation and column widths are planned from the data, and cell formatting
//! is carried over as a layered style program. Each sheet becomes one PDF file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxpdf::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     // Convert every sheet of the workbook into out/<workbook>_<sheet>.pdf
//!     let report = converter.convert_workbook("example.xlsx", "out", None)?;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Single Sheet
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xlsxpdf::{ConverterBuilder, WorkbookParser};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new().build()?;
//!     let mut parser = WorkbookParser::open_path("example.xlsx")?;
//!
//!     let result = converter.convert_sheet(&mut parser, "Sheet1", Path::new("sheet1.pdf"));
//!     if !result.success {
//!         eprintln!("failed: {:?}", result.error);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use xlsxpdf::{ConverterBuilder, Preset, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_preset(Preset::Direct)                       // threshold 6, 15 mm margins
//!         .with_sheet_selector(SheetSelector::Index(0))      // First sheet only
//!         .with_content_aware_widths(true)                   // Widths follow the content
//!         .with_word_wrap(30)                                // Wrap instead of truncating
//!         .repeat_header(true)
//!         .build()?;
//!
//!     converter.convert_workbook("example.xlsx", "out", Some("report"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Data From Another Reader
//!
//! Any type implementing [`GridProvider`] can feed the pipeline. [`MemoryWorkbook`]
//! holds data that was parsed elsewhere:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xlsxpdf::{ConverterBuilder, Grid, MemoryWorkbook};
//!
//! # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
//! let mut workbook = MemoryWorkbook::new();
//! workbook.add_sheet("Users", Grid::from_strings(vec![vec!["ID", "Name"], vec!["1", "Alice"]]));
//!
//! let converter = ConverterBuilder::new().build()?;
//! let result = converter.convert_sheet(&mut workbook, "Users", Path::new("users.pdf"));
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;
pub mod document;
mod error;
mod formatter;
mod grid;
pub mod layout;
pub mod naming;
mod parser;
mod provider;
mod security;
pub mod style;
pub mod text;
mod types;

// 公開API
pub use api::{BatchReport, ConversionResult, ConvertOptions, Preset, SheetSelector};
pub use builder::{Converter, ConverterBuilder};
pub use document::{PdfDocument, RenderOptions};
pub use error::{ColorParseError, XlsxToPdfError};
pub use grid::{Cell, EmptyCellRule, Grid, TrimmedGrid};
pub use layout::{ColumnWidthPolicy, LayoutPlan, Orientation, PageSize};
pub use parser::WorkbookParser;
pub use provider::{GridProvider, MemoryWorkbook};
pub use style::{Rgb, StyleProgram, Theme};
pub use text::TextOverflow;
pub use types::{CellCoord, CellFormat, CellRange, FormatMap, HorizontalAlign};
