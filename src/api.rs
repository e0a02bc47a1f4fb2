//! Public API Types
//!
//! 公開APIで使用する設定値・結果型を定義するモジュール。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::RenderOptions;
use crate::error::XlsxToPdfError;
use crate::grid::EmptyCellRule;
use crate::layout::{ColumnWidthPolicy, LayoutOptions, PageSize};
use crate::style::Theme;
use crate::text::TextOverflow;

fn invalid_json(e: serde_json::Error) -> XlsxToPdfError {
    XlsxToPdfError::Config(format!("Invalid options JSON: {}", e))
}

/// 変換パイプラインの定数セット
///
/// 2種類の変換方式で使われてきた定数の組み合わせを、名前付きの初期値として提供します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Preset {
    /// 書式を保持する標準の変換（デフォルト）
    ///
    /// - 6列以上で横向き（閾値5）
    /// - 余白20mm
    /// - 50文字を超えるセルは切り詰め
    #[default]
    StylePreserving,

    /// 直接変換
    ///
    /// - 7列以上で横向き（閾値6）
    /// - 余白15mm
    /// - セル文字列は加工せず、セル境界でクリップ
    Direct,
}

/// シート選択方式
///
/// 変換対象のシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを変換（デフォルト）
    #[default]
    All,

    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(0)` は最初のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Sheet1".to_string())`
    Name(String),

    /// 複数のインデックス指定
    ///
    /// 例: `SheetSelector::Indices(vec![0, 2, 4])`
    Indices(Vec<usize>),

    /// 複数のシート名指定
    ///
    /// 例: `SheetSelector::Names(vec!["Sheet1".to_string(), "Sheet2".to_string()])`
    Names(Vec<String>),
}

impl SheetSelector {
    /// ワークブックのシート一覧から変換対象を選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト（指定順）
    /// * `Err(XlsxToPdfError::Config)` - インデックスが範囲外の場合
    ///
    /// 存在しないシート名はそのまま返し、変換時にそのシートのみが
    /// `NotFound`として失敗します。
    pub fn select(&self, sheet_names: &[String]) -> Result<Vec<String>, XlsxToPdfError> {
        let by_index = |index: usize| -> Result<String, XlsxToPdfError> {
            sheet_names.get(index).cloned().ok_or_else(|| {
                XlsxToPdfError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    sheet_names.len()
                ))
            })
        };

        match self {
            SheetSelector::All => Ok(sheet_names.to_vec()),
            SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
            SheetSelector::Name(name) => Ok(vec![name.clone()]),
            SheetSelector::Indices(indices) => indices.iter().map(|&i| by_index(i)).collect(),
            SheetSelector::Names(names) => Ok(names.clone()),
        }
    }
}

/// 変換オプション
///
/// `ConverterBuilder`が組み立てる設定値で、JSONから読み込むこともできます。
/// 省略したフィールドは標準プリセットの値になります。
///
/// # 使用例
///
/// ```rust
/// use xlsxpdf::{ConvertOptions, TextOverflow};
///
/// let options = ConvertOptions::from_json(r#"{
///     "orientation_threshold": 6,
///     "overflow": { "wrap": { "width": 30 } }
/// }"#).unwrap();
///
/// assert_eq!(options.orientation_threshold, 6);
/// assert_eq!(options.overflow, TextOverflow::Wrap { width: 30 });
/// assert!(options.preserve_formatting);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// セルの書式（太字・塗りつぶし・配置など）を反映するかどうか
    pub preserve_formatting: bool,
    /// 列幅の決定方式
    pub width_policy: ColumnWidthPolicy,
    /// この列数を超えると横向きにする
    pub orientation_threshold: usize,
    /// セル文字列のはみ出し処理
    pub overflow: TextOverflow,
    /// 上下左右の余白（mm）
    pub margin_mm: f64,
    pub page_size: PageSize,
    /// トリム時の空セル判定ルール
    pub empty_cell_rule: EmptyCellRule,
    /// 改ページ後にヘッダー行を繰り返すかどうか
    pub repeat_header: bool,
    /// コンテンツストリームを圧縮するかどうか
    pub compress: bool,
    /// バッチ変換で描画を並列化するかどうか
    pub parallel: bool,
    /// 変換対象のシート
    pub sheets: SheetSelector,
    pub theme: Theme,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from_preset(Preset::StylePreserving)
    }
}

impl ConvertOptions {
    /// プリセットから設定値を生成
    pub fn from_preset(preset: Preset) -> Self {
        let base = Self {
            preserve_formatting: true,
            width_policy: ColumnWidthPolicy::Even,
            orientation_threshold: 5,
            overflow: TextOverflow::Truncate { max_chars: 50 },
            margin_mm: 20.0,
            page_size: PageSize::A4,
            empty_cell_rule: EmptyCellRule::Strict,
            repeat_header: false,
            compress: false,
            parallel: false,
            sheets: SheetSelector::All,
            theme: Theme::default(),
        };

        match preset {
            Preset::StylePreserving => base,
            Preset::Direct => Self {
                orientation_threshold: 6,
                overflow: TextOverflow::Clip,
                margin_mm: 15.0,
                theme: Theme {
                    title_space_after: 10.0,
                    title_spacer: 8.0,
                    ..Theme::default()
                },
                ..base
            },
        }
    }

    /// JSON文字列から設定値を読み込む
    pub fn from_json(json: &str) -> Result<Self, XlsxToPdfError> {
        serde_json::from_str(json).map_err(invalid_json)
    }

    /// JSONファイルから設定値を読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, XlsxToPdfError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSONに含まれるフィールドだけを現在の設定値に上書きする
    ///
    /// `theme`はフィールド単位で上書きし、それ以外はトップレベルの値ごと置き換えます。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxpdf::{ConvertOptions, Preset};
    ///
    /// let options = ConvertOptions::from_preset(Preset::Direct)
    ///     .overlay_json(r#"{"repeat_header": true}"#)
    ///     .unwrap();
    ///
    /// assert!(options.repeat_header);
    /// assert_eq!(options.orientation_threshold, 6);
    /// ```
    pub fn overlay_json(&self, json: &str) -> Result<Self, XlsxToPdfError> {
        let patch = match serde_json::from_str::<serde_json::Value>(json).map_err(invalid_json)? {
            serde_json::Value::Object(patch) => patch,
            _ => {
                return Err(XlsxToPdfError::Config(
                    "Invalid options JSON: expected an object".to_string(),
                ))
            }
        };

        let mut merged = serde_json::to_value(self).map_err(invalid_json)?;
        if let Some(target) = merged.as_object_mut() {
            for (key, value) in patch {
                if key == "theme" {
                    if let (Some(serde_json::Value::Object(theme)), serde_json::Value::Object(fields)) =
                        (target.get_mut("theme"), &value)
                    {
                        theme.extend(fields.clone());
                        continue;
                    }
                }
                target.insert(key, value);
            }
        }
        serde_json::from_value(merged).map_err(invalid_json)
    }

    /// JSONファイルの内容を現在の設定値に上書きする
    pub fn overlay_json_file(&self, path: impl AsRef<Path>) -> Result<Self, XlsxToPdfError> {
        let content = std::fs::read_to_string(path)?;
        self.overlay_json(&content)
    }

    pub(crate) fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            orientation_threshold: self.orientation_threshold,
            width_policy: self.width_policy,
            margin_mm: self.margin_mm,
            page_size: self.page_size,
        }
    }

    pub(crate) fn render_options(&self) -> RenderOptions {
        RenderOptions {
            overflow: self.overflow,
            repeat_header: self.repeat_header,
            compress: self.compress,
        }
    }
}

/// 1シート分の変換結果
///
/// 構築後に変更されることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub sheet_name: String,
    pub success: bool,
    /// 出力したPDFのパス（失敗時は`None`）
    pub output_path: Option<PathBuf>,
    /// 失敗時のエラーメッセージ
    pub error: Option<String>,
}

impl ConversionResult {
    /// 成功した結果を生成
    pub fn succeeded(sheet_name: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            success: true,
            output_path: Some(output_path.into()),
            error: None,
        }
    }

    /// 失敗した結果を生成
    pub fn failed(sheet_name: impl Into<String>, error: &XlsxToPdfError) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            success: false,
            output_path: None,
            error: Some(error.to_string()),
        }
    }
}

/// バッチ変換の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// シートごとの結果（選択順）
    pub results: Vec<ConversionResult>,
}

impl BatchReport {
    /// 成功したシート数
    pub fn converted_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// 対象シート数
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// 失敗したシート名
    pub fn failed_sheets(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.sheet_name.as_str())
            .collect()
    }

    /// すべてのシートが成功したかどうか
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// `"N/M sheets converted"`形式の集計
    pub fn summary(&self) -> String {
        format!("{}/{} sheets converted", self.converted_count(), self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sheet_selector_all() {
        let sheets = names(&["A", "B", "C"]);
        assert_eq!(SheetSelector::All.select(&sheets).unwrap(), sheets);
    }

    #[test]
    fn test_sheet_selector_index() {
        let sheets = names(&["A", "B", "C"]);
        assert_eq!(SheetSelector::Index(1).select(&sheets).unwrap(), names(&["B"]));
        assert_eq!(
            SheetSelector::Indices(vec![2, 0]).select(&sheets).unwrap(),
            names(&["C", "A"])
        );
        assert!(matches!(
            SheetSelector::Index(3).select(&sheets),
            Err(XlsxToPdfError::Config(_))
        ));
        assert!(matches!(
            SheetSelector::Indices(vec![0, 9]).select(&sheets),
            Err(XlsxToPdfError::Config(_))
        ));
    }

    #[test]
    fn test_sheet_selector_names_pass_through_unknown() {
        let sheets = names(&["A", "B"]);
        assert_eq!(
            SheetSelector::Names(names(&["B", "Missing"])).select(&sheets).unwrap(),
            names(&["B", "Missing"])
        );
    }

    #[test]
    fn test_presets() {
        let canonical = ConvertOptions::default();
        assert_eq!(canonical.orientation_threshold, 5);
        assert_eq!(canonical.margin_mm, 20.0);
        assert_eq!(canonical.overflow, TextOverflow::Truncate { max_chars: 50 });

        let direct = ConvertOptions::from_preset(Preset::Direct);
        assert_eq!(direct.orientation_threshold, 6);
        assert_eq!(direct.margin_mm, 15.0);
        assert_eq!(direct.overflow, TextOverflow::Clip);
        assert!(direct.preserve_formatting);
    }

    #[test]
    fn test_options_json_errors() {
        assert!(matches!(
            ConvertOptions::from_json("{ not json"),
            Err(XlsxToPdfError::Config(_))
        ));
        let options = ConvertOptions::from_json(r#"{"sheets": {"names": ["X"]}, "repeat_header": true}"#)
            .unwrap();
        assert_eq!(options.sheets, SheetSelector::Names(vec!["X".to_string()]));
        assert!(options.repeat_header);
    }

    #[test]
    fn test_overlay_json_keeps_preset_values() {
        let options = ConvertOptions::from_preset(Preset::Direct)
            .overlay_json(r#"{"repeat_header": true, "theme": {"title_font_size": 20.0}}"#)
            .unwrap();

        assert!(options.repeat_header);
        assert_eq!(options.orientation_threshold, 6);
        assert_eq!(options.margin_mm, 15.0);
        assert_eq!(options.overflow, TextOverflow::Clip);
        assert_eq!(options.theme.title_font_size, 20.0);
        assert_eq!(options.theme.title_spacer, 8.0);
    }

    #[test]
    fn test_overlay_json_replaces_overflow() {
        let options = ConvertOptions::default()
            .overlay_json(r#"{"overflow": {"wrap": {"width": 12}}, "empty_cell_rule": "legacy_none_sentinel"}"#)
            .unwrap();
        assert_eq!(options.overflow, TextOverflow::Wrap { width: 12 });
        assert_eq!(options.empty_cell_rule, EmptyCellRule::LegacyNoneSentinel);
    }

    #[test]
    fn test_overlay_json_errors() {
        let base = ConvertOptions::default();
        assert!(matches!(base.overlay_json("[1, 2]"), Err(XlsxToPdfError::Config(_))));
        assert!(matches!(base.overlay_json("{ nope"), Err(XlsxToPdfError::Config(_))));
        assert!(matches!(
            base.overlay_json(r#"{"orientation_threshold": "six"}"#),
            Err(XlsxToPdfError::Config(_))
        ));
    }

    #[test]
    fn test_batch_report_summary() {
        let report = BatchReport {
            results: vec![
                ConversionResult::succeeded("A", "/tmp/a.pdf"),
                ConversionResult::failed("B", &XlsxToPdfError::NotFound("B".to_string())),
                ConversionResult::succeeded("C", "/tmp/c.pdf"),
            ],
        };
        assert_eq!(report.summary(), "2/3 sheets converted");
        assert_eq!(report.failed_sheets(), vec!["B"]);
        assert!(!report.all_succeeded());
        assert_eq!(report.results[1].error.as_deref(), Some("Sheet 'B' not found"));
    }

    #[test]
    fn test_batch_report_serializes() {
        let report = BatchReport {
            results: vec![ConversionResult::succeeded("A", "out/a.pdf")],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"sheet_name\":\"A\""));
        assert!(json.contains("\"success\":true"));
    }
}
