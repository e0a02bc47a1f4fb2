//! XML Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得できないセル書式情報を抽出するモジュール。
//! `xl/styles.xml`（フォント・塗りつぶし・罫線・配置）、`xl/workbook.xml`と
//! そのリレーションシップ（シート名とワークシートXMLの対応、1904年エポック判定）、
//! および各ワークシートXMLのセルごとのスタイルIDを扱います。

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::XlsxToPdfError;
use crate::types::{CellCoord, CellFormat, FormatMap, HorizontalAlign};

/// フォント情報（fonts要素）
#[derive(Debug, Clone, Default, PartialEq)]
struct FontInfo {
    bold: bool,
    size: Option<f64>,
    color: Option<String>,
}

/// セルスタイル情報（cellXfs要素）
#[derive(Debug, Clone, Default, PartialEq)]
struct CellXf {
    font_id: Option<usize>,
    fill_id: Option<usize>,
    border_id: Option<usize>,
    horizontal: Option<HorizontalAlign>,
}

/// `xl/styles.xml`の解析結果
#[derive(Debug, Clone, Default)]
struct StyleTable {
    fonts: Vec<FontInfo>,
    /// 塗りつぶし色（パターンなし・テーマ色の場合は`None`）
    fills: Vec<Option<String>>,
    /// 罫線を持つかどうか
    borders: Vec<bool>,
    cell_xfs: Vec<CellXf>,
}

impl StyleTable {
    /// スタイルIDに対応する書式情報を解決
    fn resolve(&self, style_id: usize) -> Option<CellFormat> {
        let xf = self.cell_xfs.get(style_id)?;
        let font = xf
            .font_id
            .and_then(|id| self.fonts.get(id))
            .cloned()
            .unwrap_or_default();

        Some(CellFormat {
            bold: font.bold,
            font_size: font.size.unwrap_or(CellFormat::DEFAULT_FONT_SIZE),
            font_color: font.color,
            fill_color: xf.fill_id.and_then(|id| self.fills.get(id).cloned().flatten()),
            horizontal_align: xf.horizontal,
            has_border: xf
                .border_id
                .and_then(|id| self.borders.get(id).copied())
                .unwrap_or(false),
        })
    }
}

/// XLSXメタデータパーサー
///
/// XLSXファイル（ZIPアーカイブ）からXMLを直接解析し、
/// calamineで取得できない書式情報を抽出します。
/// ワークシートXMLは`sheet_formats`の呼び出し時に遅延して解析します。
pub(crate) struct XlsxMetadataParser {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    styles: StyleTable,
    /// シート名 -> ワークシートXMLのパス
    sheet_parts: HashMap<String, String>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl XlsxMetadataParser {
    /// XLSXファイルのバイト列からメタデータを解析
    ///
    /// ZIPアーカイブのセキュリティ検証は呼び出し側で済ませている前提です。
    pub fn new(buffer: Vec<u8>) -> Result<Self, XlsxToPdfError> {
        let mut archive = ZipArchive::new(Cursor::new(buffer))
            .map_err(|e| XlsxToPdfError::Zip(format!("{}", e)))?;

        let styles = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => StyleTable::default(),
        };

        let (sheet_targets, is_1904) = match read_part(&mut archive, "xl/workbook.xml")? {
            Some(xml) => parse_workbook(&xml)?,
            None => (Vec::new(), false),
        };

        let relationships = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };

        let sheet_parts = sheet_targets
            .into_iter()
            .filter_map(|(name, rel_id)| {
                relationships
                    .get(&rel_id)
                    .map(|target| (name, resolve_part_path(target)))
            })
            .collect();

        Ok(Self {
            archive,
            styles,
            sheet_parts,
            is_1904,
        })
    }

    /// 1904年エポックを使用するかどうかを取得
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// シートのセルごとの書式情報を取得
    ///
    /// シートに対応するワークシートXMLが見つからない場合は空のマップを返します。
    pub fn sheet_formats(&mut self, sheet_name: &str) -> Result<FormatMap, XlsxToPdfError> {
        let Some(part) = self.sheet_parts.get(sheet_name).cloned() else {
            log::debug!("no worksheet part for sheet '{}', formatting skipped", sheet_name);
            return Ok(FormatMap::new());
        };

        let Some(xml) = read_part(&mut self.archive, &part)? else {
            log::warn!("worksheet part '{}' is missing from the archive", part);
            return Ok(FormatMap::new());
        };

        let style_ids = parse_worksheet_styles(&xml)?;
        let mut formats = FormatMap::with_capacity(style_ids.len());
        for (coord, style_id) in style_ids {
            if let Some(format) = self.styles.resolve(style_id) {
                formats.insert(coord, format);
            }
        }
        Ok(formats)
    }
}

/// ZIPアーカイブ内のパートを読み込む（存在しない場合は`None`）
fn read_part(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Option<Vec<u8>>, XlsxToPdfError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(XlsxToPdfError::Zip(format!("{}", e))),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

/// リレーションシップのターゲットをアーカイブ内のパスに変換
///
/// `worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`、
/// `/xl/worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn xml_error(e: impl std::fmt::Display) -> XlsxToPdfError {
    XlsxToPdfError::Config(format!("XML parse error: {}", e))
}

fn attributes<'a>(
    e: &'a BytesStart<'_>,
) -> impl Iterator<Item = Result<Attribute<'a>, XlsxToPdfError>> + 'a {
    e.attributes().map(|attr| {
        attr.map_err(|e| XlsxToPdfError::Config(format!("XML attribute error: {}", e)))
    })
}

/// 属性値をUTF-8として読み、XMLエスケープを解除する
fn decode_attr(attr: &Attribute<'_>) -> Result<String, XlsxToPdfError> {
    let raw = std::str::from_utf8(&attr.value)?;
    Ok(quick_xml::escape::unescape(raw).map_err(xml_error)?.into_owned())
}

/// 属性値を取得（ローカル名で照合）
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XlsxToPdfError> {
    for attr in attributes(e) {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return decode_attr(&attr).map(Some);
        }
    }
    Ok(None)
}

/// `<b/>`・`<b val="0"/>`形式の真偽値要素を解釈
fn flag_value(e: &BytesStart<'_>) -> Result<bool, XlsxToPdfError> {
    Ok(match attr_value(e, b"val")?.as_deref() {
        Some("0") | Some("false") => false,
        _ => true,
    })
}

fn parse_index(value: Option<String>) -> Result<Option<usize>, XlsxToPdfError> {
    value.map(|v| v.parse::<usize>()).transpose().map_err(Into::into)
}

/// 解析中のセクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleSection {
    None,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

/// xl/styles.xml の解析
///
/// `<fonts>`、`<fills>`、`<borders>`、`<cellXfs>`を解析します。
/// `<cellStyleXfs>`は対象外です。自己終了タグ（`<b/>`など）も開始タグと同様に扱います。
fn parse_styles(xml: &[u8]) -> Result<StyleTable, XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut table = StyleTable::default();
    let mut section = StyleSection::None;
    let mut current_font: Option<FontInfo> = None;
    let mut current_fill: Option<Option<String>> = None;
    let mut solid_fill = false;
    let mut current_border: Option<bool> = None;
    let mut current_xf: Option<CellXf> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(xml_error)?
            .into_owned();
        let (e, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match (section, e.local_name().as_ref()) {
                    (_, b"fonts") | (_, b"fills") | (_, b"borders") | (_, b"cellXfs") => {
                        section = StyleSection::None;
                    }
                    (StyleSection::Fonts, b"font") => {
                        table.fonts.push(current_font.take().unwrap_or_default());
                    }
                    (StyleSection::Fills, b"fill") => {
                        table.fills.push(current_fill.take().flatten());
                    }
                    (StyleSection::Borders, b"border") => {
                        table.borders.push(current_border.take().unwrap_or(false));
                    }
                    (StyleSection::CellXfs, b"xf") => {
                        table.cell_xfs.push(current_xf.take().unwrap_or_default());
                    }
                    _ => {}
                }
                buf.clear();
                continue;
            }
            Event::Eof => break,
            _ => {
                buf.clear();
                continue;
            }
        };

        match (section, e.local_name().as_ref()) {
            (_, b"fonts") if !is_empty => section = StyleSection::Fonts,
            (_, b"fills") if !is_empty => section = StyleSection::Fills,
            (_, b"borders") if !is_empty => section = StyleSection::Borders,
            (_, b"cellXfs") if !is_empty => section = StyleSection::CellXfs,

            (StyleSection::Fonts, b"font") => {
                if is_empty {
                    table.fonts.push(FontInfo::default());
                } else {
                    current_font = Some(FontInfo::default());
                }
            }
            (StyleSection::Fonts, b"b") => {
                if let Some(font) = current_font.as_mut() {
                    font.bold = flag_value(&e)?;
                }
            }
            (StyleSection::Fonts, b"sz") => {
                if let Some(font) = current_font.as_mut() {
                    font.size = attr_value(&e, b"val")?.and_then(|v| v.parse().ok());
                }
            }
            (StyleSection::Fonts, b"color") => {
                if let Some(font) = current_font.as_mut() {
                    font.color = attr_value(&e, b"rgb")?;
                }
            }

            (StyleSection::Fills, b"fill") => {
                if is_empty {
                    table.fills.push(None);
                } else {
                    current_fill = Some(None);
                    solid_fill = false;
                }
            }
            (StyleSection::Fills, b"patternFill") => {
                let pattern = attr_value(&e, b"patternType")?;
                solid_fill = matches!(pattern.as_deref(), Some(p) if p != "none");
            }
            (StyleSection::Fills, b"fgColor") if solid_fill => {
                if let Some(fill) = current_fill.as_mut() {
                    *fill = attr_value(&e, b"rgb")?;
                }
            }

            (StyleSection::Borders, b"border") => {
                if is_empty {
                    table.borders.push(false);
                } else {
                    current_border = Some(false);
                }
            }
            (StyleSection::Borders, b"left" | b"right" | b"top" | b"bottom") => {
                let styled = matches!(attr_value(&e, b"style")?.as_deref(), Some(s) if s != "none");
                if let Some(border) = current_border.as_mut() {
                    *border |= styled;
                }
            }

            (StyleSection::CellXfs, b"xf") => {
                let xf = CellXf {
                    font_id: parse_index(attr_value(&e, b"fontId")?)?,
                    fill_id: parse_index(attr_value(&e, b"fillId")?)?,
                    border_id: parse_index(attr_value(&e, b"borderId")?)?,
                    horizontal: None,
                };
                if is_empty {
                    table.cell_xfs.push(xf);
                } else {
                    current_xf = Some(xf);
                }
            }
            (StyleSection::CellXfs, b"alignment") => {
                if let Some(xf) = current_xf.as_mut() {
                    xf.horizontal = attr_value(&e, b"horizontal")?
                        .as_deref()
                        .and_then(HorizontalAlign::from_excel);
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

/// xl/workbook.xml の解析
///
/// `<sheet name=".." r:id=".."/>`の一覧と、`<workbookPr date1904="1"/>`を取得します。
fn parse_workbook(xml: &[u8]) -> Result<(Vec<(String, String)>, bool), XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut sheets = Vec::new();
    let mut is_1904 = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    if let Some(value) = attr_value(&e, b"date1904")? {
                        is_1904 = value == "1" || value == "true";
                    }
                }
                b"sheet" => {
                    let name = attr_value(&e, b"name")?;
                    // `sheetId`と区別するため、名前空間付きの`r:id`のみを対象とする
                    let mut rel_id = None;
                    for attr in attributes(&e) {
                        let attr = attr?;
                        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                            rel_id = Some(decode_attr(&attr)?);
                        }
                    }
                    if let (Some(name), Some(rel_id)) = (name, rel_id) {
                        sheets.push((name, rel_id));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, is_1904))
}

/// リレーションシップファイルを解析（Id -> Target）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut relationships = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (attr_value(&e, b"Id")?, attr_value(&e, b"Target")?)
                    {
                        relationships.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// ワークシートXMLから、スタイルIDを持つセルの一覧を取得
///
/// `<c r="B2" s="3">`形式のセルのみを対象とします。
fn parse_worksheet_styles(xml: &[u8]) -> Result<Vec<(CellCoord, usize)>, XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut cells = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"c" {
                    let coord = attr_value(&e, b"r")?
                        .as_deref()
                        .and_then(CellCoord::from_a1_notation);
                    let style_id = parse_index(attr_value(&e, b"s")?)?;
                    if let (Some(coord), Some(style_id)) = (coord, style_id) {
                        cells.push((coord, style_id));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}
