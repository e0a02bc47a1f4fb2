//! Text Module
//!
//! セル文字列のはみ出し処理（切り詰め・折り返し・クリップ）と、
//! 標準Type1フォント（Helvetica）の文字幅計算・WinAnsiエンコードを提供します。

/// セル文字列のはみ出し処理方式
///
/// 切り詰めと折り返しは排他的で、どちらか一方のみが適用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOverflow {
    /// `max_chars`文字を超える場合、先頭`max_chars - 3`文字 + `"..."`に切り詰める
    Truncate { max_chars: usize },

    /// `width`文字を目安に単語単位で折り返す
    Wrap { width: usize },

    /// 加工せずに描画し、セル境界でクリップする
    Clip,
}

impl Default for TextOverflow {
    fn default() -> Self {
        TextOverflow::Truncate { max_chars: 50 }
    }
}

impl TextOverflow {
    /// 表示文字列に処理を適用し、描画する行のリストを返す
    ///
    /// 空文字列の場合も1行（空行）を返します。
    /// 改行コード`\r\n`・`\r`は`\n`として扱います。
    pub fn apply(&self, text: &str) -> Vec<String> {
        let normalized = normalize_newlines(text);
        let text = normalized.as_str();
        let processed = match self {
            TextOverflow::Truncate { max_chars } => truncate_text(text, *max_chars),
            TextOverflow::Wrap { width } => text
                .split('\n')
                .map(|line| wrap_text(line, *width))
                .collect::<Vec<_>>()
                .join("\n"),
            TextOverflow::Clip => text.to_string(),
        };
        processed.split('\n').map(str::to_string).collect()
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// 文字列を`max_chars`文字以内に切り詰める
///
/// # 使用例
///
/// ```rust
/// use xlsxpdf::text::truncate_text;
///
/// assert_eq!(truncate_text("short", 50), "short");
/// assert_eq!(truncate_text("abcdefghij", 8), "abcde...");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut result: String = text.chars().take(keep).collect();
    result.push_str("...");
    result
}

/// 空白区切りで貪欲に折り返す
///
/// `width`文字以下の行はそのまま返します。単語が`width`より長い場合は
/// 分割せずに1行として出力します。
pub fn wrap_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if current_len + 1 + word_len <= width {
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            }
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// 標準フォントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// 太字指定からフォントを選択
    pub fn for_weight(bold: bool) -> Self {
        if bold {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        }
    }

    /// PDFの`BaseFont`名
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// ページリソース内のフォント名
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    /// 文字列の描画幅（pt）を計算
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        let units: u32 = encode_win_ansi(text)
            .iter()
            .map(|&b| match b {
                32..=126 => table[(b - 32) as usize] as u32,
                _ => DEFAULT_GLYPH_WIDTH as u32,
            })
            .sum();
        units as f64 * font_size / 1000.0
    }
}

/// 表にない文字の幅（1/1000 em）
const DEFAULT_GLYPH_WIDTH: u16 = 556;

// AFMメトリクス（ASCII 32..=126）
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// 文字列をWinAnsiEncodingのバイト列に変換
///
/// Latin-1の範囲とWinAnsi固有の記号（€、引用符、ダッシュなど）を変換し、
/// それ以外の文字は`?`に置き換えます。
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' => b' ',
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
