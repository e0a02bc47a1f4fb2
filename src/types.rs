//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::collections::HashMap;

/// リーダーから取得したセルの生の値
///
/// 表示文字列への変換は`formatter`モジュールが担当します。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 日付時刻（Excelシリアル値）
    DateTime(f64),

    /// ISO 8601形式の日付・期間文字列
    DateTimeIso(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, self.row + 1)
    }

    /// A1形式の文字列から座標を生成（例: "B3" -> (2, 1)）
    ///
    /// `$`による絶対参照記号は無視します。形式が不正な場合は`None`を返します。
    pub fn from_a1_notation(a1: &str) -> Option<Self> {
        let mut col: u32 = 0;
        let mut row: u32 = 0;
        let mut letters = 0usize;
        let mut digits = 0usize;

        for ch in a1.chars().filter(|c| *c != '$') {
            if ch.is_ascii_alphabetic() {
                if digits > 0 {
                    return None;
                }
                let value = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
                col = col.checked_mul(26)?.checked_add(value)?;
                letters += 1;
            } else if let Some(d) = ch.to_digit(10) {
                row = row.checked_mul(10)?.checked_add(d)?;
                digits += 1;
            } else {
                return None;
            }
        }

        if letters == 0 || digits == 0 || row == 0 {
            return None;
        }

        Some(Self::new(row - 1, col - 1))
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    pub(crate) fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

/// セル範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 単一セルの範囲を生成
    pub fn cell(row: u32, col: u32) -> Self {
        let coord = CellCoord::new(row, col);
        Self::new(coord, coord)
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

/// 水平方向の配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    /// Excelの`horizontal`属性値から変換
    ///
    /// `left` / `center` / `right` 以外（`general`, `justify`, `centerContinuous`など）は
    /// `None`を返します。
    pub fn from_excel(value: &str) -> Option<Self> {
        match value {
            "left" => Some(HorizontalAlign::Left),
            "center" => Some(HorizontalAlign::Center),
            "right" => Some(HorizontalAlign::Right),
            _ => None,
        }
    }
}

/// セルの書式情報
///
/// リーダーが生成し、コアに渡された後は変更されません。
/// 色はリーダーが返した16進文字列のまま保持し、スタイル解決時に検証します。
#[derive(Debug, Clone, PartialEq)]
pub struct CellFormat {
    /// 太字かどうか
    pub bold: bool,
    /// フォントサイズ（pt）
    pub font_size: f64,
    /// 文字色（ARGBまたはRGBの16進文字列）
    pub font_color: Option<String>,
    /// 塗りつぶし色（ARGBまたはRGBの16進文字列）
    pub fill_color: Option<String>,
    /// 水平方向の配置
    pub horizontal_align: Option<HorizontalAlign>,
    /// 罫線を持つかどうか
    pub has_border: bool,
}

impl CellFormat {
    /// Excelの既定フォントサイズ
    pub const DEFAULT_FONT_SIZE: f64 = 11.0;
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            bold: false,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_color: None,
            fill_color: None,
            horizontal_align: None,
            has_border: false,
        }
    }
}

/// セル座標 -> 書式情報 のマッピング
pub type FormatMap = HashMap<CellCoord, CellFormat>;
