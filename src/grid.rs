//! Grid Module
//!
//! シートから抽出した稠密なグリッド構造と、末尾の空行・空列を除去する
//! トリム処理を提供するモジュール。
//!
//! 空セルは文字列ではなく型で表現します（`Cell::content == None`）。
//! 文字列`"None"`を空とみなす旧来の挙動は`EmptyCellRule::LegacyNoneSentinel`で
//! 明示的に有効化した場合のみ適用されます。

use crate::types::CellCoord;

/// グリッド内のセル（表示文字列）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// 表示文字列（空セルの場合は`None`）
    content: Option<String>,
}

impl Cell {
    /// 新しいセルを生成
    ///
    /// 空文字列は空セルとして扱います。
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        if content.is_empty() {
            Self::empty()
        } else {
            Self {
                content: Some(content),
            }
        }
    }

    /// 空セルを生成
    pub fn empty() -> Self {
        Self { content: None }
    }

    /// 表示文字列を取得（空セルの場合は`None`）
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// 表示文字列を取得（空セルの場合は`""`）
    pub fn display(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// 空セルかどうか
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    /// 指定されたルールで空セルとみなすかどうか
    pub fn is_blank(&self, rule: EmptyCellRule) -> bool {
        match (&self.content, rule) {
            (None, _) => true,
            (Some(text), EmptyCellRule::LegacyNoneSentinel) => text == "None",
            (Some(_), EmptyCellRule::Strict) => false,
        }
    }
}

/// トリム処理で「空」とみなすセルの判定ルール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCellRule {
    /// 値を持たないセルのみを空とみなす（デフォルト）
    #[default]
    Strict,

    /// 文字列`"None"`も空とみなす（互換モード）
    LegacyNoneSentinel,
}

/// シートから抽出した稠密なグリッド
///
/// すべての行は同じ長さ（`column_count`）を持ちます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    /// グリッドデータ（行 × 列）
    cells: Vec<Vec<Cell>>,

    /// 列数
    cols: usize,
}

impl Grid {
    /// 行データからグリッドを構築
    ///
    /// 行の長さが揃っていない場合は、最長の行に合わせて空セルで埋めます。
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows
            .into_iter()
            .map(|mut row| {
                row.resize(cols, Cell::empty());
                row
            })
            .collect();
        Self { cells, cols }
    }

    /// 文字列の行データからグリッドを構築（空文字列は空セル）
    pub fn from_strings<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::new).collect())
                .collect(),
        )
    }

    /// スパースなセルデータから稠密なグリッドを構築
    ///
    /// # 引数
    ///
    /// * `rows` - シートの行数（最大行番号）
    /// * `cols` - シートの列数（最大列番号）
    /// * `cells` - 値を持つセルの座標と表示文字列
    ///
    /// 範囲外の座標は無視されます。
    pub fn from_sparse(
        rows: usize,
        cols: usize,
        cells: impl IntoIterator<Item = (CellCoord, String)>,
    ) -> Self {
        let mut grid_cells = vec![vec![Cell::empty(); cols]; rows];

        for (coord, content) in cells {
            let (row, col) = (coord.row as usize, coord.col as usize);
            if row < rows && col < cols {
                grid_cells[row][col] = Cell::new(content);
            }
        }

        Self {
            cells: grid_cells,
            cols,
        }
    }

    /// 行数を取得
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// 列数を取得
    pub fn column_count(&self) -> usize {
        self.cols
    }

    /// 全行を取得
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// 指定されたセルを取得
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// 末尾の空行・空列を除去
    ///
    /// 1. 最終行がすべて空である限り、最終行を削除する
    /// 2. 最終列から先頭方向へ走査し、残った全行で空の列を削除する。
    ///    値を持つ列に到達した時点で停止する（途中の空列は保持される）
    pub fn trim(mut self, rule: EmptyCellRule) -> TrimmedGrid {
        while self
            .cells
            .last()
            .is_some_and(|row| row.iter().all(|cell| cell.is_blank(rule)))
        {
            self.cells.pop();
        }

        if self.cells.is_empty() {
            return TrimmedGrid(Grid::default());
        }

        let mut cols = self.cols;
        while cols > 0
            && self
                .cells
                .iter()
                .all(|row| row[cols - 1].is_blank(rule))
        {
            cols -= 1;
        }

        for row in &mut self.cells {
            row.truncate(cols);
        }
        self.cols = cols;

        TrimmedGrid(self)
    }
}

/// 末尾の空行・空列を除去したグリッド
///
/// 行数が0であるか、最終行と最終列がそれぞれ少なくとも1つの値を持ちます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrimmedGrid(Grid);

impl TrimmedGrid {
    /// 行数を取得
    pub fn row_count(&self) -> usize {
        self.0.row_count()
    }

    /// 列数を取得
    pub fn column_count(&self) -> usize {
        self.0.column_count()
    }

    /// 行が1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.0.row_count() == 0
    }

    /// 全行を取得
    pub fn rows(&self) -> &[Vec<Cell>] {
        self.0.rows()
    }

    /// 指定されたセルを取得
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.0.cell(row, col)
    }

    /// 内部のグリッドを取り出す
    pub fn into_grid(self) -> Grid {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::from_strings(rows.iter().map(|r| r.iter().copied()))
    }

    #[test]
    fn test_cell_new_empty_string_is_empty() {
        assert!(Cell::new("").is_empty());
        assert_eq!(Cell::new("").display(), "");
        assert_eq!(Cell::new("x").text(), Some("x"));
    }

    #[test]
    fn test_cell_none_literal_is_data_by_default() {
        let cell = Cell::new("None");
        assert!(!cell.is_blank(EmptyCellRule::Strict));
        assert!(cell.is_blank(EmptyCellRule::LegacyNoneSentinel));
    }

    #[test]
    fn test_grid_new_pads_rows() {
        let g = Grid::new(vec![
            vec![Cell::new("a")],
            vec![Cell::new("b"), Cell::new("c"), Cell::new("d")],
        ]);
        assert_eq!(g.column_count(), 3);
        assert!(g.rows().iter().all(|r| r.len() == 3));
        assert!(g.cell(0, 2).is_some_and(Cell::is_empty));
    }

    #[test]
    fn test_from_sparse() {
        let g = Grid::from_sparse(
            3,
            4,
            vec![
                (CellCoord::new(0, 0), "A1".to_string()),
                (CellCoord::new(2, 3), "D3".to_string()),
                (CellCoord::new(5, 5), "out of range".to_string()),
            ],
        );
        assert_eq!(g.row_count(), 3);
        assert_eq!(g.column_count(), 4);
        assert_eq!(g.cell(0, 0).and_then(Cell::text), Some("A1"));
        assert_eq!(g.cell(2, 3).and_then(Cell::text), Some("D3"));
        assert!(g.cell(1, 1).is_some_and(Cell::is_empty));
    }

    #[test]
    fn test_trim_last_row_and_two_columns_keeps_internal_gap() {
        // 列Bは途中の空列、列D・Eは末尾の空列、最終行は空行
        let g = grid(&[
            &["ID", "", "Name", "", ""],
            &["1", "", "Alice", "", ""],
            &["", "", "", "", ""],
        ]);
        let trimmed = g.trim(EmptyCellRule::Strict);

        assert_eq!(trimmed.row_count(), 2);
        assert_eq!(trimmed.column_count(), 3);
        assert!(trimmed.cell(0, 1).is_some_and(Cell::is_empty));
        assert_eq!(trimmed.cell(1, 2).and_then(Cell::text), Some("Alice"));
    }

    #[test]
    fn test_trim_is_idempotent() {
        let g = grid(&[&["a", "", "b", ""], &["", "", "", ""], &["c", "", "", ""], &["", "", "", ""]]);
        let once = g.trim(EmptyCellRule::Strict);
        let twice = once.clone().into_grid().trim(EmptyCellRule::Strict);
        assert_eq!(once, twice);
        assert_eq!(once.row_count(), 3);
        assert_eq!(once.column_count(), 3);
    }

    #[test]
    fn test_trim_does_not_remove_leading_or_internal_empty_rows() {
        let g = grid(&[&["", ""], &["x", ""], &["", ""], &["y", "z"]]);
        let trimmed = g.trim(EmptyCellRule::Strict);
        assert_eq!(trimmed.row_count(), 4);
        assert_eq!(trimmed.column_count(), 2);
    }

    #[test]
    fn test_trim_all_empty_yields_empty() {
        let g = grid(&[&["", ""], &["", ""]]);
        let trimmed = g.trim(EmptyCellRule::Strict);
        assert!(trimmed.is_empty());
        assert_eq!(trimmed.column_count(), 0);

        assert!(Grid::default().trim(EmptyCellRule::Strict).is_empty());
    }

    #[test]
    fn test_trim_none_literal_rules() {
        let g = grid(&[&["a", "b"], &["None", "None"]]);

        let strict = g.clone().trim(EmptyCellRule::Strict);
        assert_eq!(strict.row_count(), 2);

        let legacy = g.trim(EmptyCellRule::LegacyNoneSentinel);
        assert_eq!(legacy.row_count(), 1);
    }

    #[test]
    fn test_trim_whitespace_is_not_empty() {
        let g = grid(&[&["a", " "]]);
        let trimmed = g.trim(EmptyCellRule::Strict);
        assert_eq!(trimmed.column_count(), 2);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_grid() -> impl Strategy<Value = Grid> {
            (1usize..8, 1usize..8).prop_flat_map(|(rows, cols)| {
                proptest::collection::vec(
                    proptest::collection::vec(prop_oneof![Just(""), Just("v"), Just("None")], cols),
                    rows,
                )
                .prop_map(|rows| Grid::from_strings(rows))
            })
        }

        proptest! {
            #[test]
            fn test_trim_idempotent_and_tight(g in arb_grid()) {
                let trimmed = g.trim(EmptyCellRule::Strict);
                let again = trimmed.clone().into_grid().trim(EmptyCellRule::Strict);
                prop_assert_eq!(&trimmed, &again);

                if !trimmed.is_empty() {
                    let last_row = &trimmed.rows()[trimmed.row_count() - 1];
                    prop_assert!(last_row.iter().any(|c| !c.is_empty()));
                    let last_col = trimmed.column_count() - 1;
                    prop_assert!(trimmed.rows().iter().any(|r| !r[last_col].is_empty()));
                }
            }
        }
    }
}
