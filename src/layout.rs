//! Layout Planner Module
//!
//! トリム済みグリッドから、ページの向き・用紙サイズ・列幅を決定するモジュール。
//! 単位はすべてPDFポイント（1/72インチ）です。

use unicode_width::UnicodeWidthStr;

use crate::grid::TrimmedGrid;

/// 1ミリメートルあたりのポイント数
pub const MM: f64 = 72.0 / 25.4;

/// コンテンツ比例配分時の最小列幅（20mm）
pub const MIN_CONTENT_COLUMN_WIDTH: f64 = 20.0 * MM;

/// ページの向き
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// 用紙サイズ（縦向きの幅・高さ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// A4（210mm × 297mm）
    #[default]
    A4,
    /// US Letter（8.5in × 11in）
    Letter,
}

impl PageSize {
    /// 縦向きの（幅, 高さ）をポイントで取得
    pub fn portrait_dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0 * MM, 297.0 * MM),
            PageSize::Letter => (612.0, 792.0),
        }
    }

    /// 指定された向きの（幅, 高さ）をポイントで取得
    pub fn dimensions(&self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.portrait_dimensions();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// 列幅の決定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnWidthPolicy {
    /// 利用可能幅を全列で均等に分割（デフォルト）
    #[default]
    Even,

    /// 各列の最大表示幅（1行目のみ）に比例して配分
    ContentAware,
}

/// レイアウト計画のパラメータ
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutOptions {
    /// この列数を超えると横向きにする
    pub orientation_threshold: usize,
    /// 列幅の決定方式
    pub width_policy: ColumnWidthPolicy,
    /// 上下左右の余白（mm）
    pub margin_mm: f64,
    /// 用紙サイズ
    pub page_size: PageSize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orientation_threshold: 5,
            width_policy: ColumnWidthPolicy::Even,
            margin_mm: 20.0,
            page_size: PageSize::A4,
        }
    }
}

/// 1シート分のレイアウト計画
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub orientation: Orientation,
    pub page_width: f64,
    pub page_height: f64,
    /// 上下左右の余白（pt）
    pub margin: f64,
    /// 列幅（列数と同じ長さ）
    pub column_widths: Vec<f64>,
    pub usable_width: f64,
    pub usable_height: f64,
}

impl LayoutPlan {
    /// 列幅の合計
    pub fn table_width(&self) -> f64 {
        self.column_widths.iter().sum()
    }
}

/// 列数からページの向きを決定
pub fn decide_orientation(column_count: usize, threshold: usize) -> Orientation {
    if column_count > threshold {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// トリム済みグリッドのレイアウトを計画
pub fn plan_layout(grid: &TrimmedGrid, options: &LayoutOptions) -> LayoutPlan {
    let column_count = grid.column_count();
    let orientation = decide_orientation(column_count, options.orientation_threshold);
    let (page_width, page_height) = options.page_size.dimensions(orientation);
    let margin = options.margin_mm * MM;
    let usable_width = page_width - 2.0 * margin;
    let usable_height = page_height - 2.0 * margin;

    let column_widths = match options.width_policy {
        ColumnWidthPolicy::Even => even_column_widths(column_count, usable_width),
        ColumnWidthPolicy::ContentAware => content_aware_column_widths(grid, usable_width),
    };

    log::debug!(
        "layout: {} columns -> {:?}, usable {:.1}x{:.1}pt, widths {:?}",
        column_count,
        orientation,
        usable_width,
        usable_height,
        column_widths
    );

    LayoutPlan {
        orientation,
        page_width,
        page_height,
        margin,
        column_widths,
        usable_width,
        usable_height,
    }
}

/// 利用可能幅を均等に分割
pub fn even_column_widths(column_count: usize, usable_width: f64) -> Vec<f64> {
    if column_count == 0 {
        return Vec::new();
    }
    vec![usable_width / column_count as f64; column_count]
}

/// 各列の内容に応じて列幅を配分
///
/// 1. 各列について、セルの1行目の表示幅の最大値を求める（全角文字は2）
/// 2. 最大値の比率で利用可能幅を配分し、最小幅（20mm）を下回らないようにする
/// 3. 合計が利用可能幅を超えた場合は、全列を同じ比率で縮小する
///
/// 最小幅は縮小前にのみ保証されます。縮小後の列は最小幅を下回ることがあります。
///
/// すべての列が空の場合は均等分割にフォールバックします。
pub fn content_aware_column_widths(grid: &TrimmedGrid, usable_width: f64) -> Vec<f64> {
    let column_count = grid.column_count();
    if column_count == 0 {
        return Vec::new();
    }

    let mut max_lengths = vec![0usize; column_count];
    for row in grid.rows() {
        for (col_idx, cell) in row.iter().enumerate() {
            let first_line = cell.display().split(['\r', '\n']).next().unwrap_or("");
            max_lengths[col_idx] = max_lengths[col_idx].max(first_line.width());
        }
    }

    let total_length: usize = max_lengths.iter().sum();
    if total_length == 0 {
        return even_column_widths(column_count, usable_width);
    }

    let mut widths: Vec<f64> = max_lengths
        .iter()
        .map(|&len| {
            let proportion = len as f64 / total_length as f64;
            (usable_width * proportion).max(MIN_CONTENT_COLUMN_WIDTH)
        })
        .collect();

    let total_width: f64 = widths.iter().sum();
    if total_width > usable_width {
        let scale = usable_width / total_width;
        for width in &mut widths {
            *width *= scale;
        }
    }

    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{EmptyCellRule, Grid};

    const EPS: f64 = 1e-6;

    fn trimmed(rows: Vec<Vec<&str>>) -> TrimmedGrid {
        Grid::from_strings(rows).trim(EmptyCellRule::Strict)
    }

    fn populated(cols: usize) -> TrimmedGrid {
        let row: Vec<String> = (0..cols).map(|c| format!("c{}", c)).collect();
        Grid::from_strings(vec![row.clone(), row]).trim(EmptyCellRule::Strict)
    }

    #[test]
    fn test_orientation_threshold_five() {
        let options = LayoutOptions::default();
        assert_eq!(plan_layout(&populated(5), &options).orientation, Orientation::Portrait);
        assert_eq!(plan_layout(&populated(6), &options).orientation, Orientation::Landscape);
        assert_eq!(plan_layout(&populated(7), &options).orientation, Orientation::Landscape);
    }

    #[test]
    fn test_orientation_threshold_six() {
        let options = LayoutOptions {
            orientation_threshold: 6,
            ..LayoutOptions::default()
        };
        assert_eq!(plan_layout(&populated(6), &options).orientation, Orientation::Portrait);
        assert_eq!(plan_layout(&populated(7), &options).orientation, Orientation::Landscape);
    }

    #[test]
    fn test_landscape_swaps_dimensions() {
        let plan = plan_layout(&populated(8), &LayoutOptions::default());
        assert!(plan.page_width > plan.page_height);
        assert!((plan.page_width - 297.0 * MM).abs() < EPS);
        assert!((plan.usable_width - (297.0 - 40.0) * MM).abs() < EPS);
    }

    #[test]
    fn test_even_widths_fill_usable_width() {
        let plan = plan_layout(&populated(4), &LayoutOptions::default());
        assert_eq!(plan.column_widths.len(), 4);
        assert!((plan.table_width() - plan.usable_width).abs() < EPS);
        assert!(plan
            .column_widths
            .windows(2)
            .all(|w| (w[0] - w[1]).abs() < EPS));
    }

    #[test]
    fn test_content_aware_proportional() {
        let grid = trimmed(vec![vec!["a", "a much longer header text"], vec!["b", "x"]]);
        let widths = content_aware_column_widths(&grid, 500.0);
        assert_eq!(widths.len(), 2);
        assert!(widths[1] > widths[0]);

        // 1列目は最小幅まで広げられた後、全体と同じ比率で縮小される
        let floored = [MIN_CONTENT_COLUMN_WIDTH, 500.0 * 25.0 / 26.0];
        let scale = 500.0 / (floored[0] + floored[1]);
        assert!((widths[0] - floored[0] * scale).abs() < EPS);
        assert!(widths[0] < MIN_CONTENT_COLUMN_WIDTH);
        assert!((widths.iter().sum::<f64>() - 500.0).abs() < EPS);
    }

    #[test]
    fn test_content_aware_uses_first_line_only() {
        let grid = trimmed(vec![vec!["short\nthis second line is very very long", "medium text"]]);
        let widths = content_aware_column_widths(&grid, 400.0);
        assert!(widths[1] > widths[0]);

        let grid = trimmed(vec![vec!["short\r\nthis second line is very very long", "medium text"]]);
        let crlf_widths = content_aware_column_widths(&grid, 400.0);
        assert_eq!(crlf_widths, widths);
    }

    #[test]
    fn test_content_aware_rescales_when_floor_overflows() {
        // 20列 × 最小幅20mm は利用可能幅を超えるため縮小される
        let grid = populated(20);
        let usable = 170.0 * MM;
        let widths = content_aware_column_widths(&grid, usable);
        assert!(widths.iter().sum::<f64>() <= usable + EPS);
    }

    #[test]
    fn test_content_aware_counts_wide_characters() {
        let grid = trimmed(vec![vec!["abcd", "日本語表"]]);
        let widths = content_aware_column_widths(&grid, 1000.0);
        assert!(widths[1] > widths[0]);
    }

    #[test]
    fn test_empty_grid_plan() {
        let plan = plan_layout(&TrimmedGrid::default(), &LayoutOptions::default());
        assert_eq!(plan.orientation, Orientation::Portrait);
        assert!(plan.column_widths.is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_widths_never_exceed_usable(
                rows in proptest::collection::vec(
                    proptest::collection::vec("[a-z ]{0,40}", 1..15),
                    1..6,
                ),
                content_aware in any::<bool>(),
            ) {
                let grid = Grid::from_strings(rows).trim(EmptyCellRule::Strict);
                let options = LayoutOptions {
                    width_policy: if content_aware {
                        ColumnWidthPolicy::ContentAware
                    } else {
                        ColumnWidthPolicy::Even
                    },
                    ..LayoutOptions::default()
                };
                let plan = plan_layout(&grid, &options);
                prop_assert_eq!(plan.column_widths.len(), grid.column_count());
                prop_assert!(plan.table_width() <= plan.usable_width + 1e-6);
            }
        }
    }
}
