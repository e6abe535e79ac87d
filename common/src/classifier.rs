//! 行分類ヒューリスティック
//!
//! ルーブリックの1行を「節ヘッダ」か「採点項目」に分類する。
//! ルールは (述語, 役割) の順序付きテーブルとして評価し、
//! ヘッダ判定が先に成立した行は項目ルールに該当しても常にヘッダ扱い。

use regex::Regex;

/// 行の構造上の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    SectionHeader,
    Item,
}

/// 行テキストと由来セルから役割を判定する
///
/// どのルールにも該当しない行は None（節/項目ツリーに加えない）。
/// 自由テキスト入力ではセルなし（空スライス）で呼ぶ。
pub fn classify_line(text: &str, cells: &[String]) -> Option<LineRole> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_section_header(trimmed, cells) {
        return Some(LineRole::SectionHeader);
    }
    if is_item(trimmed, cells) {
        return Some(LineRole::Item);
    }
    None
}

fn is_section_header(text: &str, cells: &[String]) -> bool {
    lazy_static::lazy_static! {
        // 番号+ピリオドの直後に大文字（例: "1. History Taking"）
        static ref NUMBERED_HEADER_RE: Regex = Regex::new(r"^\s*\d+\.\s*[A-Z]").unwrap();
    }

    // 全て大文字（英字を1文字以上含む場合のみ）
    if text.chars().any(|c| c.is_alphabetic()) && !text.chars().any(|c| c.is_lowercase()) {
        return true;
    }

    if NUMBERED_HEADER_RE.is_match(text) {
        return true;
    }

    if text.ends_with(':') {
        return true;
    }

    // 短いテキストかつ非空セルが3以下（表データのヘッダ行によくある形）
    let non_empty = cells.iter().filter(|c| !c.trim().is_empty()).count();
    if !cells.is_empty() && non_empty <= 3 && text.chars().count() < 50 {
        return true;
    }

    false
}

fn is_item(text: &str, cells: &[String]) -> bool {
    lazy_static::lazy_static! {
        static ref BULLET_RE: Regex = Regex::new(r"^\s*[-•*]\s+").unwrap();
        static ref NUMBERED_RE: Regex = Regex::new(r"^\s*\d+[.)]\s+").unwrap();
        // "<語> ... <数値> points/pts"
        static ref WORD_POINTS_RE: Regex =
            Regex::new(r"(?i)[a-zA-Z].*\d+\s*(?:points?|pts?)").unwrap();
    }

    if BULLET_RE.is_match(text) || NUMBERED_RE.is_match(text) || WORD_POINTS_RE.is_match(text) {
        return true;
    }

    cells.iter().any(|c| is_bare_integer(c))
}

/// セルが裸の整数か判定
pub fn is_bare_integer(cell: &str) -> bool {
    let trimmed = cell.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// テキスト中の "<N> points" / "<N> pts" 表記から配点を取り出す
pub fn parse_inline_points(text: &str) -> Option<u32> {
    lazy_static::lazy_static! {
        static ref INLINE_POINTS_RE: Regex =
            Regex::new(r"(?i)\(?\s*(\d+)\s*(?:points?|pts?)\s*\)?").unwrap();
    }

    INLINE_POINTS_RE
        .captures(text)
        .and_then(|cap| cap[1].parse::<u32>().ok())
}
