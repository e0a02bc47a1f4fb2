//! Formatter Module
//!
//! リーダーから取得したセル値を表示文字列に変換するモジュール。
//! 数式はキャッシュされた計算結果のみを扱います。

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::warn;

use crate::error::XlsxToPdfError;
use crate::types::CellValue;

/// セルフォーマッター
///
/// セル値のフォーマット処理のファサードとして機能します。
#[derive(Debug, Default)]
pub(crate) struct CellFormatter {
    /// 日付フォーマッター
    date_formatter: DateFormatter,

    /// 数値フォーマッター
    number_formatter: NumberFormatter,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// セル値を表示文字列に変換
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(String))` - 表示文字列
    /// * `Ok(None)` - 空セルの場合
    ///
    /// 日付として表現できないシリアル値は数値のまま出力します。
    pub fn format_cell(
        &self,
        value: &CellValue,
        is_1904: bool,
    ) -> Result<Option<String>, XlsxToPdfError> {
        let formatted = match value {
            CellValue::Number(n) => self.number_formatter.format(*n),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::DateTime(serial) => match self.date_formatter.format(*serial, is_1904) {
                Ok(text) => text,
                Err(e) => {
                    warn!("{}; keeping the raw value", e);
                    self.number_formatter.format(*serial)
                }
            },
            CellValue::DateTimeIso(s) => s.replace('T', " "),
            CellValue::Empty => return Ok(None),
        };

        if formatted.is_empty() {
            Ok(None)
        } else {
            Ok(Some(formatted))
        }
    }
}

/// 日付フォーマッター
///
/// Excelのシリアル日付値を`YYYY-MM-DD HH:MM:SS`形式に変換します。
#[derive(Debug, Default)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// 日付値をフォーマット
    ///
    /// # エポックシステム
    ///
    /// - 1900年システム（デフォルト）: 1899年12月30日起算
    ///   - Excelの1900年うるう年バグにより、シリアル値60以下は1日ずれる
    /// - 1904年システム: 1904年1月1日起算（Mac版Excel）
    pub fn format(&self, serial_value: f64, is_1904: bool) -> Result<String, XlsxToPdfError> {
        let epoch = if is_1904 {
            NaiveDate::from_ymd_opt(1904, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30)
        }
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| XlsxToPdfError::Config("Invalid epoch date".to_string()))?;

        // 1900-02-29（存在しない日）より前のシリアル値は1日補正する
        let serial_value = if !is_1904 && serial_value < 61.0 {
            serial_value + 1.0
        } else {
            serial_value
        };

        let days = serial_value.floor() as i64;
        let seconds = ((serial_value - serial_value.floor()) * 86_400.0).round() as i64;

        let datetime: NaiveDateTime = Duration::try_days(days)
            .and_then(|d| epoch.checked_add_signed(d))
            .and_then(|d| Duration::try_seconds(seconds).and_then(|s| d.checked_add_signed(s)))
            .ok_or_else(|| {
                XlsxToPdfError::Config(format!(
                    "Date calculation overflow: serial_value={}, is_1904={}",
                    serial_value, is_1904
                ))
            })?;

        Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// 数値フォーマッター
///
/// 整数値は小数部なし、それ以外は最短の往復可能表現で出力します。
#[derive(Debug, Default)]
pub(crate) struct NumberFormatter;

impl NumberFormatter {
    pub fn format(&self, value: f64) -> String {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_numbers() {
        let f = CellFormatter::new();
        assert_eq!(f.format_cell(&CellValue::Number(1.0), false).unwrap(), Some("1".to_string()));
        assert_eq!(f.format_cell(&CellValue::Number(-42.0), false).unwrap(), Some("-42".to_string()));
        assert_eq!(f.format_cell(&CellValue::Number(1.5), false).unwrap(), Some("1.5".to_string()));
        assert_eq!(f.format_cell(&CellValue::Number(0.1), false).unwrap(), Some("0.1".to_string()));
    }

    #[test]
    fn test_format_bool_and_error() {
        let f = CellFormatter::new();
        assert_eq!(f.format_cell(&CellValue::Bool(true), false).unwrap(), Some("True".to_string()));
        assert_eq!(f.format_cell(&CellValue::Bool(false), false).unwrap(), Some("False".to_string()));
        assert_eq!(
            f.format_cell(&CellValue::Error("#DIV/0!".to_string()), false).unwrap(),
            Some("#DIV/0!".to_string())
        );
    }

    #[test]
    fn test_format_empty_values() {
        let f = CellFormatter::new();
        assert_eq!(f.format_cell(&CellValue::Empty, false).unwrap(), None);
        assert_eq!(f.format_cell(&CellValue::String(String::new()), false).unwrap(), None);
    }

    #[test]
    fn test_format_none_string_is_kept() {
        let f = CellFormatter::new();
        assert_eq!(
            f.format_cell(&CellValue::String("None".to_string()), false).unwrap(),
            Some("None".to_string())
        );
    }

    #[test]
    fn test_date_formatter_1900() {
        let formatter = DateFormatter;
        // 45658 = 2025-01-01
        assert_eq!(formatter.format(45658.0, false).unwrap(), "2025-01-01 00:00:00");
        // 45658.5 = 2025-01-01 12:00
        assert_eq!(formatter.format(45658.5, false).unwrap(), "2025-01-01 12:00:00");
        // 1 = 1900-01-01
        assert_eq!(formatter.format(1.0, false).unwrap(), "1900-01-01 00:00:00");
    }

    #[test]
    fn test_date_formatter_1904() {
        let formatter = DateFormatter;
        assert_eq!(formatter.format(0.0, true).unwrap(), "1904-01-01 00:00:00");
        assert_eq!(formatter.format(1.0, true).unwrap(), "1904-01-02 00:00:00");
    }

    #[test]
    fn test_date_formatter_out_of_range_serial() {
        let formatter = DateFormatter;
        assert!(matches!(formatter.format(1e15, false), Err(XlsxToPdfError::Config(_))));
        assert!(formatter.format(-1e15, true).is_err());
        assert!(formatter.format(f64::INFINITY, false).is_err());
    }

    #[test]
    fn test_out_of_range_date_keeps_number() {
        let f = CellFormatter::new();
        assert_eq!(
            f.format_cell(&CellValue::DateTime(1e15), false).unwrap(),
            Some("1000000000000000".to_string())
        );
        assert_eq!(
            f.format_cell(&CellValue::DateTime(2.5e20), false).unwrap(),
            Some("250000000000000000000".to_string())
        );
    }

    #[test]
    fn test_date_iso_passthrough() {
        let f = CellFormatter::new();
        assert_eq!(
            f.format_cell(&CellValue::DateTimeIso("2024-03-01T08:30:00".to_string()), false)
                .unwrap(),
            Some("2024-03-01 08:30:00".to_string())
        );
    }
}
