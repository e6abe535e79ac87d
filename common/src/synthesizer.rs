//! 発話例シンセサイザ
//!
//! 発話例を持たない項目に対し、テンプレート文書コーパスから
//! 該当節の例文を採取する。見つからなければ汎用テンプレートで合成する。

use regex::Regex;

use crate::corpus::{PatternLibrary, TemplateDoc};
use crate::segmenter::split_phrases;

/// 1項目あたりの発話例の上限
pub const MAX_EXAMPLES: usize = 5;

/// テンプレート内でブロックとして走査する最大行数
const BLOCK_WINDOW: usize = 12;

/// 節名に対する発話例を合成する
///
/// 重複は除去（大文字小文字は区別）し、最大5件に切り詰める。
/// コーパスから採取できない場合は汎用の3フレーズを返す。
pub fn synthesize_examples(section_name: &str, library: &PatternLibrary) -> Vec<String> {
    let mut phrases = harvest_from_templates(section_name, library.templates());
    if phrases.is_empty() {
        phrases = generic_examples(section_name);
    }

    dedup_preserving_order(&mut phrases);
    phrases.truncate(MAX_EXAMPLES);
    phrases
}

/// テンプレート文書から該当節ブロックの例文を採取する
///
/// 節名が部分一致（大文字小文字無視）する行をブロック先頭とみなし、
/// その後の examples マーカーに続く箇条書き行を集める。
fn harvest_from_templates(section_name: &str, templates: &[TemplateDoc]) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref EXAMPLE_MARKER_RE: Regex =
            Regex::new(r"(?i)^\s*(?:examples?|verbalizations?)\s*:\s*(.*)$").unwrap();
        static ref BULLET_RE: Regex = Regex::new(r"^\s*[-•*]\s+(.+)$").unwrap();
    }

    let needle = section_name.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    for doc in templates {
        let lines: Vec<&str> = doc.text.lines().collect();
        let Some(start) = lines
            .iter()
            .position(|line| line.to_lowercase().contains(&needle))
        else {
            continue;
        };

        let mut phrases = Vec::new();
        let mut in_examples = false;

        for line in lines.iter().skip(start + 1).take(BLOCK_WINDOW) {
            let trimmed = line.trim();

            if let Some(cap) = EXAMPLE_MARKER_RE.captures(trimmed) {
                in_examples = true;
                phrases.extend(split_phrases(&cap[1]));
                continue;
            }

            if in_examples {
                if let Some(cap) = BULLET_RE.captures(trimmed) {
                    phrases.push(cap[1].trim().to_string());
                } else {
                    // 箇条書きが途切れたらブロック終了
                    break;
                }
            }
        }

        if !phrases.is_empty() {
            return phrases;
        }
    }

    Vec::new()
}

/// 汎用テンプレートから3フレーズを合成する
fn generic_examples(section_name: &str) -> Vec<String> {
    let name = section_name.trim().to_lowercase();
    vec![
        format!("Perform {} assessment", name),
        format!("I am going to check your {}", name),
        format!("Let me evaluate the {} now", name),
    ]
}

/// 出現順を保った重複除去
fn dedup_preserving_order(phrases: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    phrases.retain(|p| seen.insert(p.clone()));
}
