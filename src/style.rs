//! Style Resolver Module
//!
//! テーブルのスタイルを、範囲指定の命令（`StyleDirective`）を順に並べた
//! `StyleProgram`として構築するモジュール。
//!
//! 命令は追加のみで、適用時には同じセル・同じ属性種別について
//! 後の命令が前の命令を上書きします（後勝ち）。

use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;
use crate::types::{CellCoord, CellFormat, CellRange, FormatMap, HorizontalAlign};

/// RGB色（各成分0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// グレースケール
    pub const fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    /// 16進文字列から色を生成
    ///
    /// 8桁はARGB（先頭2桁のアルファは破棄）、6桁はRGBとして解釈します。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxpdf::Rgb;
    ///
    /// let red = Rgb::from_hex("FFFF0000").unwrap();
    /// assert_eq!(red, Rgb::new(1.0, 0.0, 0.0));
    /// assert!(Rgb::from_hex("FF00F").is_err());
    /// ```
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let rgb = match value.len() {
            8 => value.get(2..),
            6 => Some(value),
            len => {
                return Err(ColorParseError::InvalidLength {
                    value: value.to_string(),
                    len,
                })
            }
        }
        .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| ColorParseError::InvalidDigit(value.to_string()))?;

        let component = |range: std::ops::Range<usize>| -> Result<f64, ColorParseError> {
            rgb.get(range)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .map(|v| v as f64 / 255.0)
                .ok_or_else(|| ColorParseError::InvalidDigit(value.to_string()))
        };

        Ok(Self::new(component(0..2)?, component(2..4)?, component(4..6)?))
    }
}

/// 線のスタイル
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// 線幅（pt）
    pub width: f64,
    pub color: Rgb,
}

/// 垂直方向の配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// パディングの辺
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// テーブルの配色・寸法の定数一式
///
/// スタイルの既定値はすべてここに集約されます。JSONから読み込むことも可能です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub header_background: Rgb,
    pub header_text_color: Rgb,
    pub header_font_size: f64,
    /// ヘッダー行の上下パディング
    pub header_padding: f64,
    pub body_background: Rgb,
    pub body_text_color: Rgb,
    pub body_font_size: f64,
    /// データ行の上下パディング
    pub body_padding: f64,
    /// 全セルの左右パディング
    pub side_padding: f64,
    pub grid_line: LineStyle,
    /// ヘッダー行の下線
    pub header_rule: LineStyle,
    /// 偶数番目のデータ行の背景色
    pub band_color: Rgb,
    /// 書式上書き時のフォントサイズの下限・上限
    pub min_font_size: f64,
    pub max_font_size: f64,
    /// 行の高さ = 行数 × フォントサイズ × line_spacing + 上下パディング
    pub line_spacing: f64,
    pub title_font_size: f64,
    pub title_color: Rgb,
    pub title_space_after: f64,
    pub title_spacer: f64,
    pub empty_title_font_size: f64,
    pub empty_spacer: f64,
    pub empty_message_font_size: f64,
}

impl Default for Theme {
    fn default() -> Self {
        let header_background = Rgb::new(0.2, 0.4, 0.6);
        Self {
            header_background,
            header_text_color: Rgb::WHITE,
            header_font_size: 10.0,
            header_padding: 8.0,
            body_background: Rgb::WHITE,
            body_text_color: Rgb::BLACK,
            body_font_size: 9.0,
            body_padding: 6.0,
            side_padding: 8.0,
            grid_line: LineStyle {
                width: 0.5,
                color: Rgb::gray(0.7),
            },
            header_rule: LineStyle {
                width: 2.0,
                color: header_background,
            },
            band_color: Rgb::gray(0.95),
            min_font_size: 6.0,
            max_font_size: 14.0,
            line_spacing: 1.2,
            title_font_size: 14.0,
            title_color: Rgb::new(0.0, 0.0, 0.545),
            title_space_after: 12.0,
            title_spacer: 10.0,
            empty_title_font_size: 18.0,
            empty_spacer: 20.0,
            empty_message_font_size: 10.0,
        }
    }
}

/// スタイル属性
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleAttr {
    /// 太字（`true`）または標準（`false`）
    Bold(bool),
    FontSize(f64),
    TextColor(Rgb),
    Background(Rgb),
    Align(HorizontalAlign),
    VAlign(VerticalAlign),
    Padding(Side, f64),
    /// セルの四辺の罫線
    Grid(LineStyle),
    /// セルの下辺の線
    LineBelow(LineStyle),
}

/// 属性の種別（後勝ちの判定単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Font,
    FontSize,
    TextColor,
    Background,
    Align,
    VAlign,
    Padding(Side),
    Grid,
    LineBelow,
}

impl StyleAttr {
    /// 属性の種別を取得
    pub fn kind(&self) -> AttrKind {
        match self {
            StyleAttr::Bold(_) => AttrKind::Font,
            StyleAttr::FontSize(_) => AttrKind::FontSize,
            StyleAttr::TextColor(_) => AttrKind::TextColor,
            StyleAttr::Background(_) => AttrKind::Background,
            StyleAttr::Align(_) => AttrKind::Align,
            StyleAttr::VAlign(_) => AttrKind::VAlign,
            StyleAttr::Padding(side, _) => AttrKind::Padding(*side),
            StyleAttr::Grid(_) => AttrKind::Grid,
            StyleAttr::LineBelow(_) => AttrKind::LineBelow,
        }
    }
}

/// 範囲に対するスタイル命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDirective {
    pub span: CellRange,
    pub attr: StyleAttr,
}

/// セル四辺のパディング
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// 1セル分の解決済みスタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: f64,
    pub text_color: Rgb,
    pub background: Option<Rgb>,
    pub align: HorizontalAlign,
    pub valign: VerticalAlign,
    pub padding: Padding,
    pub grid: Option<LineStyle>,
    pub line_below: Option<LineStyle>,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            bold: false,
            font_size: 10.0,
            text_color: Rgb::BLACK,
            background: None,
            align: HorizontalAlign::Left,
            valign: VerticalAlign::Top,
            padding: Padding::default(),
            grid: None,
            line_below: None,
        }
    }
}

impl CellStyle {
    fn apply(&mut self, attr: &StyleAttr) {
        match *attr {
            StyleAttr::Bold(bold) => self.bold = bold,
            StyleAttr::FontSize(size) => self.font_size = size,
            StyleAttr::TextColor(color) => self.text_color = color,
            StyleAttr::Background(color) => self.background = Some(color),
            StyleAttr::Align(align) => self.align = align,
            StyleAttr::VAlign(valign) => self.valign = valign,
            StyleAttr::Padding(Side::Top, v) => self.padding.top = v,
            StyleAttr::Padding(Side::Right, v) => self.padding.right = v,
            StyleAttr::Padding(Side::Bottom, v) => self.padding.bottom = v,
            StyleAttr::Padding(Side::Left, v) => self.padding.left = v,
            StyleAttr::Grid(line) => self.grid = Some(line),
            StyleAttr::LineBelow(line) => self.line_below = Some(line),
        }
    }
}

/// 順序付きのスタイル命令列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleProgram {
    directives: Vec<StyleDirective>,
}

impl StyleProgram {
    /// 空のプログラムを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 命令を末尾に追加
    pub fn push(&mut self, span: CellRange, attr: StyleAttr) {
        self.directives.push(StyleDirective { span, attr });
    }

    /// 全命令を追加順に取得
    pub fn directives(&self) -> &[StyleDirective] {
        &self.directives
    }

    /// 指定セルに適用される命令を追加順に取得
    pub fn directives_for(&self, coord: CellCoord) -> impl Iterator<Item = &StyleDirective> {
        self.directives
            .iter()
            .filter(move |d| d.span.contains(coord))
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// 単一セルのスタイルを解決
    pub fn resolve(&self, coord: CellCoord) -> CellStyle {
        let mut style = CellStyle::default();
        for directive in self.directives_for(coord) {
            style.apply(&directive.attr);
        }
        style
    }

    /// `rows × cols`の全セルのスタイルを一括で解決
    ///
    /// 命令を1回ずつ走査し、範囲内のセルに適用します。
    pub fn resolve_all(&self, rows: usize, cols: usize) -> Vec<Vec<CellStyle>> {
        let mut styles = vec![vec![CellStyle::default(); cols]; rows];
        if rows == 0 || cols == 0 {
            return styles;
        }

        for directive in &self.directives {
            let span = directive.span;
            let row_end = (span.end.row as usize).min(rows - 1);
            let col_end = (span.end.col as usize).min(cols - 1);
            for row in styles
                .iter_mut()
                .take(row_end + 1)
                .skip(span.start.row as usize)
            {
                for style in row.iter_mut().take(col_end + 1).skip(span.start.col as usize) {
                    style.apply(&directive.attr);
                }
            }
        }

        styles
    }
}

fn rows_range(first: u32, last: u32, cols: u32) -> CellRange {
    CellRange::new(CellCoord::new(first, 0), CellCoord::new(last, cols - 1))
}

/// テーブル全体のスタイルプログラムを構築
///
/// # 引数
///
/// * `rows` - トリム後の行数
/// * `cols` - トリム後の列数
/// * `formats` - セル座標ごとの書式情報
/// * `theme` - 配色・寸法の定数
/// * `preserve_formatting` - `true`の場合、セル個別の書式を上書き命令として追加
///
/// 構築順序は、ヘッダー行、データ行、縞模様、セル個別の書式（行優先順）です。
/// 不正な色指定は警告ログを出力して無視します。
pub fn build_style_program(
    rows: usize,
    cols: usize,
    formats: &FormatMap,
    theme: &Theme,
    preserve_formatting: bool,
) -> StyleProgram {
    let mut program = StyleProgram::new();
    if rows == 0 || cols == 0 {
        return program;
    }

    let (rows_u32, cols_u32) = (rows as u32, cols as u32);
    let last_row = rows_u32 - 1;
    let header = rows_range(0, 0, cols_u32);
    let all = rows_range(0, last_row, cols_u32);

    // ヘッダー行
    program.push(header, StyleAttr::Background(theme.header_background));
    program.push(header, StyleAttr::TextColor(theme.header_text_color));
    program.push(header, StyleAttr::Align(HorizontalAlign::Center));
    program.push(header, StyleAttr::Bold(true));
    program.push(header, StyleAttr::FontSize(theme.header_font_size));
    program.push(header, StyleAttr::Padding(Side::Top, theme.header_padding));
    program.push(header, StyleAttr::Padding(Side::Bottom, theme.header_padding));

    // データ行
    if rows > 1 {
        let body = rows_range(1, last_row, cols_u32);
        program.push(body, StyleAttr::Background(theme.body_background));
        program.push(body, StyleAttr::TextColor(theme.body_text_color));
        program.push(body, StyleAttr::Bold(false));
        program.push(body, StyleAttr::FontSize(theme.body_font_size));
        program.push(body, StyleAttr::Align(HorizontalAlign::Left));
        program.push(body, StyleAttr::Padding(Side::Top, theme.body_padding));
        program.push(body, StyleAttr::Padding(Side::Bottom, theme.body_padding));
    }
    program.push(all, StyleAttr::Padding(Side::Left, theme.side_padding));
    program.push(all, StyleAttr::Padding(Side::Right, theme.side_padding));

    program.push(all, StyleAttr::Grid(theme.grid_line));
    program.push(header, StyleAttr::LineBelow(theme.header_rule));
    program.push(all, StyleAttr::VAlign(VerticalAlign::Top));

    // 縞模様
    for row in (2..rows_u32).step_by(2) {
        program.push(
            rows_range(row, row, cols_u32),
            StyleAttr::Background(theme.band_color),
        );
    }

    if preserve_formatting {
        let mut coords: Vec<&CellCoord> = formats
            .keys()
            .filter(|c| c.row < rows_u32 && c.col < cols_u32)
            .collect();
        coords.sort();

        for coord in coords {
            if let Some(format) = formats.get(coord) {
                push_cell_overrides(&mut program, *coord, format, theme);
            }
        }
    }

    log::debug!(
        "style program: {} directives for {}x{} table",
        program.len(),
        rows,
        cols
    );

    program
}

fn push_cell_overrides(
    program: &mut StyleProgram,
    coord: CellCoord,
    format: &CellFormat,
    theme: &Theme,
) {
    let span = CellRange::new(coord, coord);

    if format.bold {
        program.push(span, StyleAttr::Bold(true));
    }

    if format.font_size > 0.0 && format.font_size != CellFormat::DEFAULT_FONT_SIZE {
        let size = format
            .font_size
            .max(theme.min_font_size)
            .min(theme.max_font_size);
        program.push(span, StyleAttr::FontSize(size));
    }

    if let Some(fill) = format.fill_color.as_deref() {
        if !is_opaque_white(fill) {
            match Rgb::from_hex(fill) {
                Ok(color) => program.push(span, StyleAttr::Background(color)),
                Err(e) => log::warn!(
                    "skipping background of cell {}: {}",
                    coord.to_a1_notation(),
                    e
                ),
            }
        }
    }

    if let Some(align) = format.horizontal_align {
        program.push(span, StyleAttr::Align(align));
    }
}

fn is_opaque_white(value: &str) -> bool {
    value.eq_ignore_ascii_case("FFFFFFFF") || value.eq_ignore_ascii_case("FFFFFF")
}
