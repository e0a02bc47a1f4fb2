//! Document Assembler Module
//!
//! レイアウト計画とスタイルプログラムからPDF文書を組み立て、
//! 一時ファイル経由でアトミックに書き出すモジュール。
//!
//! フォントは標準Type1フォント（Helvetica / Helvetica-Bold、WinAnsiEncoding）を使用し、
//! フォントファイルは埋め込みません。

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::XlsxToPdfError;
use crate::grid::TrimmedGrid;
use crate::layout::LayoutPlan;
use crate::style::{CellStyle, LineStyle, Rgb, StyleProgram, Theme, VerticalAlign};
use crate::text::{encode_win_ansi, StandardFont, TextOverflow};
use crate::types::HorizontalAlign;

/// 空シートの場合に表示するメッセージ
pub const EMPTY_SHEET_MESSAGE: &str = "This sheet is empty or contains no data.";

/// 描画オプション
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// セル文字列のはみ出し処理
    pub overflow: TextOverflow,
    /// 改ページ後にヘッダー行を繰り返すかどうか
    pub repeat_header: bool,
    /// コンテンツストリームを圧縮するかどうか
    pub compress: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            overflow: TextOverflow::default(),
            repeat_header: false,
            compress: false,
        }
    }
}

/// 組み立て済みのPDF文書
#[derive(Debug)]
pub struct PdfDocument {
    document: Document,
    page_count: usize,
}

impl PdfDocument {
    /// ページ数
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// PDFのバイト列を生成
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, XlsxToPdfError> {
        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| XlsxToPdfError::Render(e.to_string()))?;
        Ok(buffer)
    }
}

/// シートのPDF文書を組み立てる
///
/// トリム後のグリッドが空の場合は、シート名とメッセージのみの
/// プレースホルダーページを生成します（エラーにはなりません）。
///
/// # 引数
///
/// * `sheet_name` - タイトルに表示するシート名
/// * `grid` - トリム済みグリッド
/// * `plan` - `layout::plan_layout`で計算したレイアウト
/// * `program` - `style::build_style_program`で構築したスタイル
/// * `theme` - タイトル等の配色・寸法
/// * `options` - 描画オプション
pub fn assemble(
    sheet_name: &str,
    grid: &TrimmedGrid,
    plan: &LayoutPlan,
    program: &StyleProgram,
    theme: &Theme,
    options: &RenderOptions,
) -> Result<PdfDocument, XlsxToPdfError> {
    if grid.is_empty() {
        log::debug!("sheet '{}' is empty, rendering placeholder page", sheet_name);
        let pages = vec![placeholder_page(sheet_name, plan, theme)];
        return build_document(sheet_name, plan, pages, options.compress);
    }

    if plan.column_widths.len() != grid.column_count() {
        return Err(XlsxToPdfError::Render(format!(
            "layout has {} column widths for {} columns",
            plan.column_widths.len(),
            grid.column_count()
        )));
    }

    let table = TableRenderer::new(grid, plan, program, theme, options);
    let pages = table.paginate(sheet_name);
    build_document(sheet_name, plan, pages, options.compress)
}

/// PDFを一時ファイルに書き出し、成功時にのみ出力パスへ移動する
///
/// 出力ディレクトリが存在しない場合は作成します。途中で失敗した場合、
/// 一時ファイルは削除され、出力パスには何も残りません。
pub fn write_pdf_atomic(pdf: &mut PdfDocument, output_path: &Path) -> Result<(), XlsxToPdfError> {
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".xlsxpdf-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        pdf.document
            .save_to(&mut writer)
            .map_err(|e| XlsxToPdfError::Render(e.to_string()))?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(output_path).map_err(|e| XlsxToPdfError::Io(e.error))?;
    Ok(())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![real(color.r), real(color.g), real(color.b)]
}

/// 1ページ分の描画命令
///
/// 罫線は背景の上に描画されるよう、ページ確定時に末尾へまとめて出力します。
#[derive(Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    lines: Vec<Operation>,
}

impl PageCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new("rg", color_operands(color)));
        self.operations
            .push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
        self.operations.push(Operation::new("f", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, line: LineStyle) {
        self.set_stroke(line);
        self.lines
            .push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
        self.lines.push(Operation::new("S", vec![]));
    }

    fn hline(&mut self, x: f64, y: f64, w: f64, line: LineStyle) {
        self.set_stroke(line);
        self.lines.push(Operation::new("m", vec![real(x), real(y)]));
        self.lines.push(Operation::new("l", vec![real(x + w), real(y)]));
        self.lines.push(Operation::new("S", vec![]));
    }

    fn set_stroke(&mut self, line: LineStyle) {
        self.lines.push(Operation::new("w", vec![real(line.width)]));
        self.lines.push(Operation::new("RG", color_operands(line.color)));
    }

    /// 1行のテキストを描画（`y`はベースライン）
    fn text(&mut self, font: StandardFont, size: f64, color: Rgb, x: f64, y: f64, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), real(size)],
        ));
        self.operations.push(Operation::new("rg", color_operands(color)));
        self.operations.push(Operation::new(
            "Td",
            vec![real(x), real(y)],
        ));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations
            .push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
        self.operations.push(Operation::new("W", vec![]));
        self.operations.push(Operation::new("n", vec![]));
    }

    fn pop_clip(&mut self) {
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn finish(mut self) -> Vec<Operation> {
        if !self.lines.is_empty() {
            self.operations.push(Operation::new("q", vec![]));
            self.operations.append(&mut self.lines);
            self.operations.push(Operation::new("Q", vec![]));
        }
        self.operations
    }
}

/// 空シート用のページ
fn placeholder_page(sheet_name: &str, plan: &LayoutPlan, theme: &Theme) -> Vec<Operation> {
    let mut canvas = PageCanvas::default();
    let x = plan.margin;
    let mut y = plan.page_height - plan.margin;

    let title_size = theme.empty_title_font_size;
    canvas.text(
        StandardFont::HelveticaBold,
        title_size,
        Rgb::BLACK,
        x,
        y - title_size,
        &format!("Sheet: {}", sheet_name),
    );
    y -= title_size * theme.line_spacing + theme.empty_spacer;

    let message_size = theme.empty_message_font_size;
    canvas.text(
        StandardFont::Helvetica,
        message_size,
        Rgb::BLACK,
        x,
        y - message_size,
        EMPTY_SHEET_MESSAGE,
    );

    canvas.finish()
}

/// 1セル分の描画内容
struct CellContent {
    lines: Vec<String>,
    style: CellStyle,
}

struct TableRenderer<'a> {
    plan: &'a LayoutPlan,
    theme: &'a Theme,
    repeat_header: bool,
    rows: Vec<Vec<CellContent>>,
    heights: Vec<f64>,
    /// テーブル左端のx座標（水平方向に中央寄せ）
    left: f64,
}

impl<'a> TableRenderer<'a> {
    fn new(
        grid: &TrimmedGrid,
        plan: &'a LayoutPlan,
        program: &StyleProgram,
        theme: &'a Theme,
        options: &RenderOptions,
    ) -> Self {
        let styles = program.resolve_all(grid.row_count(), grid.column_count());

        let rows: Vec<Vec<CellContent>> = grid
            .rows()
            .iter()
            .zip(styles)
            .map(|(cells, row_styles)| {
                cells
                    .iter()
                    .zip(row_styles)
                    .map(|(cell, style)| CellContent {
                        lines: options.overflow.apply(cell.display()),
                        style,
                    })
                    .collect()
            })
            .collect();

        let heights = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| {
                        c.lines.len().max(1) as f64 * c.style.font_size * theme.line_spacing
                            + c.style.padding.top
                            + c.style.padding.bottom
                    })
                    .fold(0.0, f64::max)
            })
            .collect();

        let left = plan.margin + (plan.usable_width - plan.table_width()).max(0.0) / 2.0;

        Self {
            plan,
            theme,
            repeat_header: options.repeat_header,
            rows,
            heights,
            left,
        }
    }

    /// 行単位で改ページしながら全ページを描画
    fn paginate(&self, sheet_name: &str) -> Vec<Vec<Operation>> {
        let top = self.plan.page_height - self.plan.margin;
        let bottom = self.plan.margin;

        let mut pages = Vec::new();
        let mut canvas = PageCanvas::default();
        let mut y = self.draw_title(&mut canvas, sheet_name, top);
        let mut rows_on_page = 0usize;

        for (index, &height) in self.heights.iter().enumerate() {
            // タイトル直下に収まらなくても、空のページに収まる行は次ページへ送る
            let after_title = pages.is_empty() && rows_on_page == 0;
            let fits_fresh_page = height <= top - bottom;
            if y - height < bottom && (rows_on_page > 0 || (after_title && fits_fresh_page)) {
                pages.push(std::mem::take(&mut canvas).finish());
                y = top;
                rows_on_page = 0;

                if self.repeat_header && index > 0 {
                    let header_height = self.heights[0].min(top - bottom);
                    self.draw_row(&mut canvas, 0, y, header_height);
                    y -= header_height;
                }
            }

            // 1ページに収まらない行はページ末尾で切り取る
            let height = height.min((y - bottom).max(0.0));
            self.draw_row(&mut canvas, index, y, height);
            y -= height;
            rows_on_page += 1;
        }

        pages.push(canvas.finish());
        log::debug!(
            "sheet '{}': {} rows on {} page(s)",
            sheet_name,
            self.rows.len(),
            pages.len()
        );
        pages
    }

    /// タイトルを描画し、続く要素の上端のy座標を返す
    fn draw_title(&self, canvas: &mut PageCanvas, sheet_name: &str, top: f64) -> f64 {
        let size = self.theme.title_font_size;
        let font = StandardFont::HelveticaBold;
        let width = font.text_width(sheet_name, size);
        let x = (self.plan.page_width - width) / 2.0;
        canvas.text(font, size, self.theme.title_color, x, top - size, sheet_name);
        top - size * self.theme.line_spacing - self.theme.title_space_after - self.theme.title_spacer
    }

    fn draw_row(&self, canvas: &mut PageCanvas, index: usize, top: f64, height: f64) {
        let y = top - height;
        let mut x = self.left;

        for (cell, &width) in self.rows[index].iter().zip(&self.plan.column_widths) {
            let style = &cell.style;

            if let Some(background) = style.background {
                canvas.fill_rect(x, y, width, height, background);
            }

            self.draw_cell_text(canvas, cell, x, top, width, height);

            if let Some(line) = style.grid {
                canvas.stroke_rect(x, y, width, height, line);
            }
            if let Some(line) = style.line_below {
                canvas.hline(x, y, width, line);
            }

            x += width;
        }
    }

    fn draw_cell_text(
        &self,
        canvas: &mut PageCanvas,
        cell: &CellContent,
        x: f64,
        top: f64,
        width: f64,
        height: f64,
    ) {
        if cell.lines.iter().all(String::is_empty) {
            return;
        }

        let style = &cell.style;
        let font = StandardFont::for_weight(style.bold);
        let size = style.font_size;
        let leading = size * self.theme.line_spacing;
        let padding = style.padding;

        let inner_height = height - padding.top - padding.bottom;
        let text_height = cell.lines.len() as f64 * leading;
        let offset = match style.valign {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Middle => ((inner_height - text_height) / 2.0).max(0.0),
            VerticalAlign::Bottom => (inner_height - text_height).max(0.0),
        };

        canvas.push_clip(x, top - height, width, height);
        for (i, line) in cell.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let text_width = font.text_width(line, size);
            let text_x = match style.align {
                HorizontalAlign::Left => x + padding.left,
                HorizontalAlign::Center => {
                    x + padding.left + (width - padding.left - padding.right - text_width) / 2.0
                }
                HorizontalAlign::Right => x + width - padding.right - text_width,
            };
            let baseline = top - padding.top - offset - i as f64 * leading - size;
            canvas.text(font, size, style.text_color, text_x, baseline, line);
        }
        canvas.pop_clip();
    }
}

/// ページの描画命令からPDF文書を構築
fn build_document(
    title: &str,
    plan: &LayoutPlan,
    pages: Vec<Vec<Operation>>,
    compress: bool,
) -> Result<PdfDocument, XlsxToPdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(StandardFont::Helvetica));
    let bold_id = doc.add_object(font_dictionary(StandardFont::HelveticaBold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            StandardFont::Helvetica.resource_name() => regular_id,
            StandardFont::HelveticaBold.resource_name() => bold_id,
        },
    });

    let page_count = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| XlsxToPdfError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(plan.page_width), real(plan.page_height)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal(concat!("xlsxpdf ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", info_id);

    if compress {
        doc.compress();
    }

    Ok(PdfDocument {
        document: doc,
        page_count,
    })
}

fn font_dictionary(font: StandardFont) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}
