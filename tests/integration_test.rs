//! Integration Tests for xlsxpdf
//!
//! XLSXファイルからPDFまでの変換パイプライン全体を検証します。
//! テスト用のワークブックは`rust_xlsxwriter`でメモリ上に生成します。

use std::path::Path;

use lopdf::{Document, Object};
use rust_xlsxwriter::*;
use xlsxpdf::{
    CellCoord, ConverterBuilder, Grid, GridProvider, HorizontalAlign, MemoryWorkbook, Preset,
    SheetSelector, WorkbookParser, XlsxToPdfError,
};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// ID/Name表（3行目は空行）
    pub fn generate_users() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Users")?;

        worksheet.write_string(0, 0, "ID")?;
        worksheet.write_string(0, 1, "Name")?;
        worksheet.write_number(1, 0, 1)?;
        worksheet.write_string(1, 1, "Alice")?;
        worksheet.write_string(2, 0, "")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 3シートのワークブック（2枚目は空シート）
    pub fn generate_multi_sheets() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Summary")?;
        sheet1.write_string(0, 0, "Total")?;
        sheet1.write_number(1, 0, 42)?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Blank")?;

        let sheet3 = workbook.add_worksheet();
        sheet3.set_name("Q1 (draft)")?;
        sheet3.write_string(0, 0, "Quarter")?;
        sheet3.write_string(1, 0, "Q1")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 指定した列数のヘッダー行とデータ行を持つ表
    pub fn generate_wide_table(columns: u16) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for col in 0..columns {
            worksheet.write_string(0, col, &format!("Col{}", col + 1))?;
            worksheet.write_number(1, col, col as f64)?;
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// 書式付きのセルを含む表
    pub fn generate_formatted() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let bold = Format::new().set_bold();
        let highlighted = Format::new()
            .set_background_color(Color::RGB(0xFFFF00))
            .set_font_size(16)
            .set_align(FormatAlign::Center);

        worksheet.write_string_with_format(0, 0, "Item", &bold)?;
        worksheet.write_string(0, 1, "Price")?;
        worksheet.write_string(1, 0, "Apple")?;
        worksheet.write_number_with_format(1, 1, 120, &highlighted)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 日付書式で表現できないシリアル値を含むシート
    pub fn generate_out_of_range_date() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let good = workbook.add_worksheet();
        good.set_name("Good")?;
        good.write_string(0, 0, "ID")?;

        let bad = workbook.add_worksheet();
        bad.set_name("Bad")?;
        bad.write_string(0, 0, "When")?;
        bad.write_number_with_format(1, 0, 1e15, &date_format)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 最初の値がC3から始まるシート
    pub fn generate_offset_table() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(2, 2, "corner")?;
        worksheet.write_number(3, 3, 2.5)?;
        worksheet.write_boolean(3, 2, true)?;

        Ok(workbook.save_to_buffer()?)
    }
}

/// ワークブックを一時ディレクトリに書き出す
fn write_fixture(dir: &Path, name: &str, data: Vec<u8>) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// 1ページ目の(幅, 高さ)を取得
fn first_page_size(path: &Path) -> (f64, f64) {
    let doc = Document::load(path).unwrap();
    let pages = doc.get_pages();
    let page_id = *pages.values().next().unwrap();
    let media_box = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .clone();

    let number = |obj: &Object| match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("Unexpected MediaBox entry: {:?}", other),
    };
    (number(&media_box[2]), number(&media_box[3]))
}

fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

#[test]
fn test_end_to_end_users_table() {
    let dir = tempfile::tempdir().unwrap();
    let data = fixtures::generate_users().unwrap();

    let mut parser = WorkbookParser::from_bytes(data).unwrap();
    let grid = parser.get_cells("Users").unwrap().trim(Default::default());
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 2);
    assert_eq!(grid.cell(1, 0).unwrap().text(), Some("1"));

    let output = dir.path().join("users.pdf");
    let converter = ConverterBuilder::new().build().unwrap();
    let result = converter.convert_sheet(&mut parser, "Users", &output);

    assert!(result.success, "{:?}", result.error);
    assert!(std::fs::metadata(&output).unwrap().len() > 0);
    let (width, height) = first_page_size(&output);
    assert!(width < height, "expected portrait, got {}x{}", width, height);
}

#[test]
fn test_convert_workbook_names_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(
        dir.path(),
        "quarterly.xlsx",
        fixtures::generate_multi_sheets().unwrap(),
    );
    let out_dir = dir.path().join("pdf");

    let converter = ConverterBuilder::new().build().unwrap();
    let report = converter.convert_workbook(&input, &out_dir, None).unwrap();

    assert_eq!(report.summary(), "3/3 sheets converted");
    assert!(out_dir.join("quarterly_Summary.pdf").exists());
    assert!(out_dir.join("quarterly_Blank.pdf").exists());
    assert!(out_dir.join("quarterly_Q1 draft.pdf").exists());
    assert_eq!(page_count(&out_dir.join("quarterly_Blank.pdf")), 1);
}

#[test]
fn test_convert_workbook_with_prefix_and_selector() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(
        dir.path(),
        "book.xlsx",
        fixtures::generate_multi_sheets().unwrap(),
    );

    let converter = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Indices(vec![2, 0]))
        .build()
        .unwrap();
    let report = converter
        .convert_workbook(&input, dir.path(), Some("report"))
        .unwrap();

    let order: Vec<&str> = report.results.iter().map(|r| r.sheet_name.as_str()).collect();
    assert_eq!(order, vec!["Q1 (draft)", "Summary"]);
    assert!(dir.path().join("report_Q1 draft.pdf").exists());
    assert!(dir.path().join("report_Summary.pdf").exists());
    assert!(!dir.path().join("report_Blank.pdf").exists());
}

#[test]
fn test_unknown_sheet_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(
        dir.path(),
        "book.xlsx",
        fixtures::generate_multi_sheets().unwrap(),
    );

    let converter = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Names(vec![
            "Summary".to_string(),
            "Nope".to_string(),
        ]))
        .build()
        .unwrap();
    let report = converter.convert_workbook(&input, dir.path(), None).unwrap();

    assert_eq!(report.summary(), "1/2 sheets converted");
    assert_eq!(report.failed_sheets(), vec!["Nope"]);
    assert!(report.results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("not found"));
}

#[test]
fn test_out_of_range_date_serial_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(
        dir.path(),
        "dates.xlsx",
        fixtures::generate_out_of_range_date().unwrap(),
    );

    let converter = ConverterBuilder::new().build().unwrap();
    let report = converter.convert_workbook(&input, dir.path(), None).unwrap();

    assert_eq!(report.summary(), "2/2 sheets converted");

    let mut parser = WorkbookParser::open_path(&input).unwrap();
    let grid = parser.get_cells("Bad").unwrap();
    assert_eq!(grid.cell(1, 0).unwrap().text(), Some("1000000000000000"));
}

#[test]
fn test_out_of_range_index_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "book.xlsx", fixtures::generate_users().unwrap());

    let converter = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Index(5))
        .build()
        .unwrap();
    let result = converter.convert_workbook(&input, dir.path(), None);

    assert!(matches!(result, Err(XlsxToPdfError::Config(_))));
}

#[test]
fn test_seven_columns_are_landscape() {
    let dir = tempfile::tempdir().unwrap();
    let mut parser = WorkbookParser::from_bytes(fixtures::generate_wide_table(7).unwrap()).unwrap();
    let output = dir.path().join("wide.pdf");

    let converter = ConverterBuilder::new().build().unwrap();
    let result = converter.convert_sheet(&mut parser, "Sheet1", &output);

    assert!(result.success, "{:?}", result.error);
    let (width, height) = first_page_size(&output);
    assert!(width > height, "expected landscape, got {}x{}", width, height);
}

#[test]
fn test_direct_preset_keeps_six_columns_portrait() {
    let dir = tempfile::tempdir().unwrap();
    let data = fixtures::generate_wide_table(6).unwrap();

    let canonical = dir.path().join("canonical.pdf");
    let direct = dir.path().join("direct.pdf");

    let mut parser = WorkbookParser::from_bytes(data.clone()).unwrap();
    ConverterBuilder::new()
        .build()
        .unwrap()
        .convert_sheet(&mut parser, "Sheet1", &canonical);

    let mut parser = WorkbookParser::from_bytes(data).unwrap();
    ConverterBuilder::new()
        .with_preset(Preset::Direct)
        .build()
        .unwrap()
        .convert_sheet(&mut parser, "Sheet1", &direct);

    let (w, h) = first_page_size(&canonical);
    assert!(w > h);
    let (w, h) = first_page_size(&direct);
    assert!(w < h);
}

#[test]
fn test_formatting_is_read_from_styles() {
    let mut parser = WorkbookParser::from_bytes(fixtures::generate_formatted().unwrap()).unwrap();
    let formats = parser.get_formatting("Sheet1").unwrap();

    let header = formats.get(&CellCoord::new(0, 0)).unwrap();
    assert!(header.bold);

    let price = formats.get(&CellCoord::new(1, 1)).unwrap();
    assert!(!price.bold);
    assert_eq!(price.font_size, 16.0);
    assert_eq!(price.horizontal_align, Some(HorizontalAlign::Center));
    let fill = price.fill_color.as_deref().unwrap().to_ascii_uppercase();
    assert!(fill.ends_with("FFFF00"), "unexpected fill {}", fill);
}

#[test]
fn test_formatted_sheet_converts() {
    let dir = tempfile::tempdir().unwrap();
    let mut parser = WorkbookParser::from_bytes(fixtures::generate_formatted().unwrap()).unwrap();
    let output = dir.path().join("formatted.pdf");

    let converter = ConverterBuilder::new().compress(true).build().unwrap();
    let result = converter.convert_sheet(&mut parser, "Sheet1", &output);

    assert!(result.success, "{:?}", result.error);
    assert_eq!(page_count(&output), 1);
}

#[test]
fn test_offset_start_cell_keeps_coordinates() {
    let mut parser = WorkbookParser::from_bytes(fixtures::generate_offset_table().unwrap()).unwrap();
    let grid = parser.get_cells("Sheet1").unwrap();

    assert_eq!(grid.row_count(), 4);
    assert_eq!(grid.column_count(), 4);
    assert!(grid.cell(0, 0).unwrap().is_empty());
    assert_eq!(grid.cell(2, 2).unwrap().text(), Some("corner"));
    assert_eq!(grid.cell(3, 2).unwrap().text(), Some("True"));
    assert_eq!(grid.cell(3, 3).unwrap().text(), Some("2.5"));
}

#[test]
fn test_memory_workbook_and_parser_agree() {
    let dir = tempfile::tempdir().unwrap();
    let mut memory = MemoryWorkbook::new();
    memory.add_sheet(
        "Users",
        Grid::from_strings(vec![vec!["ID", "Name"], vec!["1", "Alice"], vec!["", ""]]),
    );
    let mut parser = WorkbookParser::from_bytes(fixtures::generate_users().unwrap()).unwrap();

    assert_eq!(
        memory.get_cells("Users").unwrap().trim(Default::default()),
        parser.get_cells("Users").unwrap().trim(Default::default())
    );

    let converter = ConverterBuilder::new().build().unwrap();
    let result = converter.convert_sheet(&mut memory, "Users", &dir.path().join("m.pdf"));
    assert!(result.success);
}

#[test]
fn test_open_path_missing_file() {
    let result = WorkbookParser::open_path("definitely/not/here.xlsx");
    assert!(matches!(result, Err(XlsxToPdfError::Io(_))));
}
