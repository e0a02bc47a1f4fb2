//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::api::{BatchReport, ConversionResult, ConvertOptions, Preset, SheetSelector};
use crate::document::{assemble, write_pdf_atomic};
use crate::error::XlsxToPdfError;
use crate::grid::{EmptyCellRule, TrimmedGrid};
use crate::layout::{plan_layout, ColumnWidthPolicy, MM};
use crate::naming::{workbook_stem, OutputNamer};
use crate::parser::WorkbookParser;
use crate::provider::GridProvider;
use crate::style::{build_style_program, Theme};
use crate::text::TextOverflow;
use crate::types::FormatMap;

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値（`Preset::StylePreserving`）が設定されており、
/// 必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use xlsxpdf::{ConverterBuilder, SheetSelector};
///
/// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .with_orientation_threshold(6)
///     .with_word_wrap(30)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    options: ConvertOptions,
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 書式の保持: 有効
    /// - 列幅: 均等割り
    /// - 向きの閾値: 5列（6列以上で横向き）
    /// - はみ出し処理: 50文字で切り詰め
    /// - 余白: 20mm、用紙: A4
    /// - ヘッダー行の繰り返し・圧縮・並列描画: 無効
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
        }
    }

    /// プリセットの定数セットで設定を置き換える
    ///
    /// 以前に設定した値はすべて上書きされるため、最初に呼び出してください。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxpdf::{ConverterBuilder, Preset};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_preset(Preset::Direct)
    ///     .repeat_header(true);
    /// ```
    pub fn with_preset(mut self, preset: Preset) -> Self {
        let sheets = std::mem::take(&mut self.options.sheets);
        self.options = ConvertOptions {
            sheets,
            ..ConvertOptions::from_preset(preset)
        };
        self
    }

    /// 設定値をまとめて置き換える（JSONから読み込んだ設定など）
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// セル個別の書式を反映するかどうか
    pub fn preserve_formatting(mut self, preserve: bool) -> Self {
        self.options.preserve_formatting = preserve;
        self
    }

    /// 列幅をセル内容の表示幅に比例させるかどうか
    pub fn with_content_aware_widths(mut self, enabled: bool) -> Self {
        self.options.width_policy = if enabled {
            ColumnWidthPolicy::ContentAware
        } else {
            ColumnWidthPolicy::Even
        };
        self
    }

    /// 横向きにする列数の閾値（この列数を超えると横向き）
    pub fn with_orientation_threshold(mut self, threshold: usize) -> Self {
        self.options.orientation_threshold = threshold;
        self
    }

    /// セル文字列を指定文字数で切り詰める
    ///
    /// 超過した場合は先頭`max_chars - 3`文字に`"..."`を付加します。
    pub fn with_truncate_length(mut self, max_chars: usize) -> Self {
        self.options.overflow = TextOverflow::Truncate { max_chars };
        self
    }

    /// セル文字列を指定文字数で単語単位に折り返す
    pub fn with_word_wrap(mut self, width: usize) -> Self {
        self.options.overflow = TextOverflow::Wrap { width };
        self
    }

    /// セル文字列を加工せず、セル境界でクリップする
    pub fn with_clip(mut self) -> Self {
        self.options.overflow = TextOverflow::Clip;
        self
    }

    /// 上下左右の余白（mm）
    pub fn with_margin_mm(mut self, margin_mm: f64) -> Self {
        self.options.margin_mm = margin_mm;
        self
    }

    /// 配色・寸法のテーマ
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.options.theme = theme;
        self
    }

    /// 改ページ後の各ページ先頭にヘッダー行を繰り返すかどうか
    pub fn repeat_header(mut self, enabled: bool) -> Self {
        self.options.repeat_header = enabled;
        self
    }

    /// 文字列`"None"`を空セルとみなすかどうか
    ///
    /// 古い出力との互換用です。通常は無効のままにしてください。
    pub fn legacy_none_sentinel(mut self, enabled: bool) -> Self {
        self.options.empty_cell_rule = if enabled {
            EmptyCellRule::LegacyNoneSentinel
        } else {
            EmptyCellRule::Strict
        };
        self
    }

    /// PDFのストリームを圧縮するかどうか
    pub fn compress(mut self, enabled: bool) -> Self {
        self.options.compress = enabled;
        self
    }

    /// バッチ変換で描画処理を並列化するかどうか
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.options.parallel = enabled;
        self
    }

    /// 変換対象のシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxpdf::{ConverterBuilder, SheetSelector};
    ///
    /// // 単一シートを名前で指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Sheet1".to_string()));
    ///
    /// // 複数シートを指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Indices(vec![0, 2]));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.options.sheets = selector;
        self
    }

    /// 設定を検証し、`Converter`を構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)` - 設定が有効な場合
    /// * `Err(XlsxToPdfError::Config)` - 設定値が不正な場合
    ///
    /// # 検証内容
    ///
    /// 1. 向きの閾値が1以上
    /// 2. 切り詰め文字数が4以上、折り返し幅が1以上
    /// 3. 余白が0以上かつ用紙の短辺の半分未満
    /// 4. テーマのフォントサイズが正の値
    pub fn build(self) -> Result<Converter, XlsxToPdfError> {
        let options = &self.options;

        // 1. 向きの閾値
        if options.orientation_threshold == 0 {
            return Err(XlsxToPdfError::Config(
                "Orientation threshold must be at least 1".to_string(),
            ));
        }

        // 2. はみ出し処理
        match options.overflow {
            TextOverflow::Truncate { max_chars } if max_chars < 4 => {
                return Err(XlsxToPdfError::Config(format!(
                    "Truncate length must be at least 4 (got {})",
                    max_chars
                )));
            }
            TextOverflow::Wrap { width } if width == 0 => {
                return Err(XlsxToPdfError::Config(
                    "Wrap width must be at least 1".to_string(),
                ));
            }
            _ => {}
        }

        // 3. 余白
        let (page_width, page_height) = options.page_size.portrait_dimensions();
        let margin = options.margin_mm * MM;
        if !options.margin_mm.is_finite()
            || margin < 0.0
            || margin * 2.0 >= page_width.min(page_height)
        {
            return Err(XlsxToPdfError::Config(format!(
                "Invalid margin: {} mm",
                options.margin_mm
            )));
        }

        // 4. フォントサイズ
        let theme = &options.theme;
        let sizes = [
            ("header_font_size", theme.header_font_size),
            ("body_font_size", theme.body_font_size),
            ("min_font_size", theme.min_font_size),
            ("max_font_size", theme.max_font_size),
            ("title_font_size", theme.title_font_size),
            ("empty_title_font_size", theme.empty_title_font_size),
            ("empty_message_font_size", theme.empty_message_font_size),
        ];
        if let Some((name, size)) = sizes.iter().find(|(_, size)| !(*size > 0.0)) {
            return Err(XlsxToPdfError::Config(format!(
                "Font size '{}' must be positive (got {})",
                name, size
            )));
        }
        if theme.min_font_size > theme.max_font_size {
            return Err(XlsxToPdfError::Config(format!(
                "min_font_size ({}) exceeds max_font_size ({})",
                theme.min_font_size, theme.max_font_size
            )));
        }

        Ok(Converter::new(self.options))
    }
}

/// 抽出済みのシート（描画待ち）
enum SheetJob {
    Render {
        sheet_name: String,
        output_path: PathBuf,
        grid: TrimmedGrid,
        formats: FormatMap,
    },
    Failed(ConversionResult),
}

/// 変換処理のファサード
///
/// シートをPDFに変換するためのメインエントリーポイントです。
/// 内部状態を持たないため、出力パスが異なれば複数スレッドから同時に使用できます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::ConverterBuilder;
///
/// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
/// let converter = ConverterBuilder::new().build()?;
/// let report = converter.convert_workbook("report.xlsx", "out", None)?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    /// 変換設定
    options: ConvertOptions,
}

impl Converter {
    pub(crate) fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// 変換設定
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// 1シートをPDFに変換
    ///
    /// # 引数
    ///
    /// * `provider` - シートのセルデータと書式情報を提供するリーダー
    /// * `sheet_name` - 変換するシート名
    /// * `output_path` - 出力先のPDFパス（そのまま使用されます）
    ///
    /// # 戻り値
    ///
    /// 変換結果。エラーは返さず、失敗した場合は`success == false`の結果になります。
    ///
    /// # 処理フロー
    ///
    /// 1. セルデータの抽出とトリム
    /// 2. レイアウト計画（向き・列幅）
    /// 3. スタイルプログラムの構築
    /// 4. PDF文書の組み立て
    /// 5. 一時ファイル経由での書き出し
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, Grid, MemoryWorkbook};
    ///
    /// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
    /// let mut workbook = MemoryWorkbook::new();
    /// workbook.add_sheet("Users", Grid::from_strings(vec![vec!["ID", "Name"], vec!["1", "Alice"]]));
    ///
    /// let converter = ConverterBuilder::new().build()?;
    /// let result = converter.convert_sheet(&mut workbook, "Users", "out/users.pdf".as_ref());
    /// assert!(result.success);
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_sheet(
        &self,
        provider: &mut dyn GridProvider,
        sheet_name: &str,
        output_path: &Path,
    ) -> ConversionResult {
        let outcome = self
            .extract(provider, sheet_name)
            .and_then(|(grid, formats)| self.render(sheet_name, &grid, &formats, output_path));
        Self::report(sheet_name, output_path, outcome)
    }

    /// 複数シートを出力ディレクトリに変換
    ///
    /// 出力ファイル名は`<base>_<シート名>.pdf`です。セルデータの抽出は順番に行い、
    /// `parallel`が有効な場合は描画のみを並列化します。結果は`sheet_names`の順序で返します。
    ///
    /// 1シートの失敗は他のシートに影響しません。
    pub fn convert_sheets(
        &self,
        provider: &mut dyn GridProvider,
        sheet_names: &[String],
        output_dir: &Path,
        base: &str,
    ) -> BatchReport {
        let mut namer = OutputNamer::new(output_dir, base);
        let jobs: Vec<SheetJob> = sheet_names
            .iter()
            .map(|sheet_name| {
                let output_path = namer.path_for(sheet_name);
                match self.extract(provider, sheet_name) {
                    Ok((grid, formats)) => SheetJob::Render {
                        sheet_name: sheet_name.clone(),
                        output_path,
                        grid,
                        formats,
                    },
                    Err(e) => SheetJob::Failed(Self::report(sheet_name, &output_path, Err(e))),
                }
            })
            .collect();

        let results = if self.options.parallel {
            jobs.into_par_iter().map(|job| self.run_job(job)).collect()
        } else {
            jobs.into_iter().map(|job| self.run_job(job)).collect()
        };

        let report = BatchReport { results };
        log::info!("{}", report.summary());
        report
    }

    /// XLSXファイルの選択されたシートを出力ディレクトリに変換
    ///
    /// # 引数
    ///
    /// * `input_path` - XLSXファイルのパス
    /// * `output_dir` - 出力ディレクトリ（存在しない場合は作成）
    /// * `prefix` - 出力ファイル名の接頭辞（`None`の場合はワークブックのファイル名）
    ///
    /// # 戻り値
    ///
    /// * `Ok(BatchReport)` - シートごとの結果（個々の失敗を含む）
    /// * `Err(XlsxToPdfError)` - ワークブックを開けない場合、またはシートのインデックスが範囲外の場合
    pub fn convert_workbook(
        &self,
        input_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        prefix: Option<&str>,
    ) -> Result<BatchReport, XlsxToPdfError> {
        let input_path = input_path.as_ref();
        let mut parser = WorkbookParser::open_path(input_path)?;
        let sheet_names = self.options.sheets.select(&parser.sheet_names())?;
        let base = prefix
            .map(str::to_string)
            .unwrap_or_else(|| workbook_stem(input_path));

        Ok(self.convert_sheets(&mut parser, &sheet_names, output_dir.as_ref(), &base))
    }

    /// セルデータと書式情報を取得し、グリッドをトリムする
    fn extract(
        &self,
        provider: &mut dyn GridProvider,
        sheet_name: &str,
    ) -> Result<(TrimmedGrid, FormatMap), XlsxToPdfError> {
        let grid = provider.get_cells(sheet_name)?;
        let (raw_rows, raw_cols) = (grid.row_count(), grid.column_count());
        let trimmed = grid.trim(self.options.empty_cell_rule);
        log::debug!(
            "sheet '{}': trimmed {}x{} to {}x{}",
            sheet_name,
            raw_rows,
            raw_cols,
            trimmed.row_count(),
            trimmed.column_count()
        );

        let formats = if self.options.preserve_formatting && !trimmed.is_empty() {
            provider.get_formatting(sheet_name)?
        } else {
            FormatMap::new()
        };
        Ok((trimmed, formats))
    }

    /// レイアウト・スタイル・文書の組み立てを行い、PDFを書き出す
    fn render(
        &self,
        sheet_name: &str,
        grid: &TrimmedGrid,
        formats: &FormatMap,
        output_path: &Path,
    ) -> Result<(), XlsxToPdfError> {
        let options = &self.options;
        let plan = plan_layout(grid, &options.layout_options());
        let program = build_style_program(
            grid.row_count(),
            grid.column_count(),
            formats,
            &options.theme,
            options.preserve_formatting,
        );
        let mut pdf = assemble(
            sheet_name,
            grid,
            &plan,
            &program,
            &options.theme,
            &options.render_options(),
        )?;
        write_pdf_atomic(&mut pdf, output_path)?;
        log::debug!(
            "sheet '{}': {} page(s), {:?}",
            sheet_name,
            pdf.page_count(),
            plan.orientation
        );
        Ok(())
    }

    fn run_job(&self, job: SheetJob) -> ConversionResult {
        match job {
            SheetJob::Render {
                sheet_name,
                output_path,
                grid,
                formats,
            } => {
                let outcome = self.render(&sheet_name, &grid, &formats, &output_path);
                Self::report(&sheet_name, &output_path, outcome)
            }
            SheetJob::Failed(result) => result,
        }
    }

    fn report(
        sheet_name: &str,
        output_path: &Path,
        outcome: Result<(), XlsxToPdfError>,
    ) -> ConversionResult {
        match outcome {
            Ok(()) => {
                log::info!("converted sheet '{}' to {}", sheet_name, output_path.display());
                ConversionResult::succeeded(sheet_name, output_path)
            }
            Err(e) => {
                log::error!("failed to convert sheet '{}': {}", sheet_name, e);
                ConversionResult::failed(sheet_name, &e)
            }
        }
    }
}
