//! Output Naming Module
//!
//! バッチ変換時の出力ファイル名（`<接頭辞>_<シート名>.pdf`）を生成します。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// シート名をファイル名に使える文字列に変換
///
/// 英数字（Unicodeを含む）、空白、`-`、`_`のみを残し、末尾の空白を除去します。
///
/// # 使用例
///
/// ```rust
/// use xlsxpdf::naming::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("Q1/Q2 Report "), "Q1Q2 Report");
/// assert_eq!(sanitize_sheet_name("売上-2024"), "売上-2024");
/// ```
pub fn sanitize_sheet_name(sheet_name: &str) -> String {
    let kept: String = sheet_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

/// ワークブックのパスからファイル名の接頭辞（拡張子を除いたファイル名）を取得
pub fn workbook_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string())
}

/// 出力ファイル名を生成
pub fn output_file_name(base: &str, sheet_name: &str) -> String {
    format!("{}_{}.pdf", base, sanitize_sheet_name(sheet_name))
}

/// 1回のバッチ内で出力パスが重複しないように名前を割り当てる
///
/// 異なるシート名が同じファイル名に変換される場合（`"A/B"`と`"AB"`など）、
/// 2つ目以降に`_2`、`_3`...を付加します。
#[derive(Debug)]
pub(crate) struct OutputNamer {
    dir: PathBuf,
    base: String,
    used: HashSet<String>,
}

impl OutputNamer {
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            used: HashSet::new(),
        }
    }

    /// シートの出力パスを割り当てる
    pub fn path_for(&mut self, sheet_name: &str) -> PathBuf {
        let stem = format!("{}_{}", self.base, sanitize_sheet_name(sheet_name));
        let mut candidate = format!("{}.pdf", stem);
        let mut n = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{}_{}.pdf", stem, n);
            n += 1;
        }
        self.dir.join(candidate)
    }
}
