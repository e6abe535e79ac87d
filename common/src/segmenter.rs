//! 節/項目セグメンタ
//!
//! 入力行を元の順序で走査し、節→項目のツリーを組み立てる。
//! - 表データ: 行分類ヒューリスティック + パターン類似度で役割を決める
//! - 自由テキスト: 明示的な項目マーカー（"Criteria N:"、"N. 名前"、箇条書き）を
//!   正規表現で拾い、直後の examples 行から発話例を採取する

use regex::Regex;

use crate::classifier::{classify_line, is_bare_integer, parse_inline_points, LineRole};
use crate::corpus::PatternLibrary;
use crate::similarity::best_match;
use crate::types::{derive_exam_id, ConfidenceTag, Criterion, PatternKind, Section, SheetTable};

/// examples マーカー探索の先読み行数
const EXAMPLE_LOOKAHEAD: usize = 6;

/// マーカー行の後から発話例を採取する最大行数
const EXAMPLE_HARVEST_TAIL: usize = 3;

/// 表データを節/項目ツリーへ分割する
///
/// 戻り値は (節リスト, 類似度マッチしたパターン数)。
pub fn segment_table(sheets: &[SheetTable], library: &PatternLibrary) -> (Vec<Section>, usize) {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    let mut matched_count = 0usize;

    for sheet in sheets {
        for row in &sheet.rows {
            let non_empty: Vec<&str> = row
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect();
            if non_empty.is_empty() {
                continue;
            }

            let text = non_empty.join(" | ");
            let (role, pattern_matched) =
                match best_match(&text, non_empty.len(), library.patterns()) {
                    Some(pattern) => {
                        matched_count += 1;
                        let role = match pattern.kind {
                            PatternKind::SectionHeader => LineRole::SectionHeader,
                            PatternKind::Item => LineRole::Item,
                        };
                        (Some(role), true)
                    }
                    None => (classify_line(&text, row), false),
                };

            match role {
                Some(LineRole::SectionHeader) => {
                    if let Some(section) = current.take() {
                        sections.push(section);
                    }
                    current = Some(open_section(&text, &non_empty, pattern_matched));
                }
                Some(LineRole::Item) => {
                    if let Some(section) = current.as_mut() {
                        if let Some(item) = extract_item(&non_empty, &section.name) {
                            section.items.push(item);
                        }
                    }
                }
                None => {}
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    (sections, matched_count)
}

/// ヘッダ行から新しい節を開く
fn open_section(text: &str, cells: &[&str], pattern_matched: bool) -> Section {
    // 名前は裸の整数でない最初のセルを基準にする（なければ行全体）
    let name_source = cells
        .iter()
        .find(|c| !is_bare_integer(c) && c.chars().count() > 2)
        .copied()
        .unwrap_or(text);
    let name = clean_heading(name_source);

    // 配点: インライン表記、なければ裸の整数セルの最大値
    let max_points = parse_inline_points(text).unwrap_or_else(|| {
        cells
            .iter()
            .filter(|c| is_bare_integer(c))
            .filter_map(|c| c.trim().parse::<u32>().ok())
            .max()
            .unwrap_or(0)
    });

    let confidence_tag = if pattern_matched || max_points > 0 {
        ConfidenceTag::High
    } else {
        ConfidenceTag::Low
    };

    Section {
        name,
        max_points,
        items: Vec::new(),
        confidence_tag,
    }
}

/// 項目行から採点項目を抽出する
///
/// 配点は最初の裸整数セル、説明は長さ3以上の最初のセル。
/// 説明がクリーニング後に空になる行は捨てる。
fn extract_item(cells: &[&str], section_name: &str) -> Option<Criterion> {
    let points_cell = cells
        .iter()
        .find(|c| is_bare_integer(c))
        .and_then(|c| c.trim().parse::<u32>().ok());

    let description_source = cells.iter().find(|c| c.chars().count() > 2)?;
    let description = clean_item_text(description_source);
    if description.is_empty() {
        return None;
    }

    // 独立セルに配点がなければ説明文中のインライン表記を試す
    let points = points_cell
        .or_else(|| parse_inline_points(description_source))
        .unwrap_or(1);

    Some(Criterion {
        id: derive_exam_id(&description),
        name: description.clone(),
        description,
        points,
        examples: Vec::new(),
        section: section_name.to_string(),
    })
}

/// 自由テキストを節/項目ツリーへ分割する
///
/// マッチした項目ごとに、項目1つを抱えた節を作る。
pub fn segment_text(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sections = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(raw) = criterion_capture(line) else {
            continue;
        };

        let points = parse_inline_points(&raw);
        let name = clean_heading(&raw);
        if name.is_empty() {
            continue;
        }

        let examples = harvest_examples(&lines, i + 1);
        let item = Criterion {
            id: derive_exam_id(&name),
            name: name.clone(),
            description: name.clone(),
            points: points.unwrap_or(1),
            examples,
            section: name.clone(),
        };

        sections.push(Section {
            name,
            max_points: points.unwrap_or(0),
            items: vec![item],
            confidence_tag: if points.is_some() {
                ConfidenceTag::High
            } else {
                ConfidenceTag::Low
            },
        });
    }

    sections
}

/// 行が項目マーカーなら本文部分を返す
fn criterion_capture(line: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref CRITERIA_LINE_RE: Regex =
            Regex::new(r"(?i)^\s*criteria\s+\d+\s*:\s*(.+)$").unwrap();
        static ref NUMBERED_LINE_RE: Regex = Regex::new(r"^\s*\d+[.)]\s+(.+)$").unwrap();
        static ref BULLET_LINE_RE: Regex = Regex::new(r"^\s*[-•*]\s+(.+)$").unwrap();
    }

    for re in [&*CRITERIA_LINE_RE, &*NUMBERED_LINE_RE, &*BULLET_LINE_RE] {
        if let Some(cap) = re.captures(line) {
            return Some(cap[1].trim().to_string());
        }
    }
    None
}

/// 項目行直後の examples/verbalization マーカーから発話例を集める
///
/// 先読みは有界で、次の項目マーカーに達したら打ち切る。
fn harvest_examples(lines: &[&str], start: usize) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref EXAMPLE_MARKER_RE: Regex =
            Regex::new(r"(?i)^\s*(?:examples?|verbalizations?)\s*:\s*(.*)$").unwrap();
    }

    let window_end = (start + EXAMPLE_LOOKAHEAD).min(lines.len());
    for j in start..window_end {
        if criterion_capture(lines[j]).is_some() {
            return Vec::new();
        }

        if let Some(cap) = EXAMPLE_MARKER_RE.captures(lines[j]) {
            let mut phrases = split_phrases(&cap[1]);

            let tail_end = (j + 1 + EXAMPLE_HARVEST_TAIL).min(lines.len());
            for continuation in &lines[j + 1..tail_end] {
                if continuation.trim().is_empty() || criterion_capture(continuation).is_some() {
                    break;
                }
                phrases.extend(split_phrases(continuation));
            }
            return phrases;
        }
    }

    Vec::new()
}

/// カンマ/セミコロン区切りのフレーズに分割する
pub fn split_phrases(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// 節/項目名のクリーニング
///
/// 先頭の番号・箇条書き記号、末尾の配点表記と句読点を落とす。
pub fn clean_heading(text: &str) -> String {
    lazy_static::lazy_static! {
        static ref LEADING_MARKER_RE: Regex =
            Regex::new(r"(?i)^\s*(?:[-•*]\s+|\d+\s*[.)]\s*|criteria\s+\d+\s*:\s*)").unwrap();
        static ref TRAILING_POINTS_RE: Regex =
            Regex::new(r"(?i)\s*[\(\[]?\s*\d+\s*(?:points?|pts?)\s*[\)\]]?\s*$").unwrap();
    }

    let without_marker = LEADING_MARKER_RE.replace(text, "");
    let without_points = TRAILING_POINTS_RE.replace(&without_marker, "");
    without_points
        .trim()
        .trim_end_matches(&[':', '.', '-', ' '][..])
        .to_string()
}

/// 項目説明のクリーニング（節名と同じ規則）
fn clean_item_text(text: &str) -> String {
    clean_heading(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusData, PatternLibrary};

    fn table(rows: Vec<Vec<&str>>) -> Vec<SheetTable> {
        vec![SheetTable {
            sheet_name: "Sheet1".to_string(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| c.to_string()).collect())
                .collect(),
        }]
    }

    #[test]
    fn test_segment_table_basic() {
        let sheets = table(vec![
            vec!["HISTORY TAKING", "", "10"],
            vec![
                "asks about onset and duration of the presenting complaint",
                "open ended questioning technique assessed here",
                "2",
                "comments",
            ],
            vec![
                "asks about aggravating and relieving factors in detail",
                "complete coverage of the symptom history expected",
                "3",
                "comments",
            ],
            vec!["PHYSICAL EXAMINATION", "", "5"],
            vec![
                "inspects the affected area under adequate lighting",
                "both sides compared systematically during inspection",
                "5",
                "comments",
            ],
        ]);

        let (sections, matched) = segment_table(&sheets, &PatternLibrary::empty());
        assert_eq!(matched, 0);
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].name, "HISTORY TAKING");
        assert_eq!(sections[0].max_points, 10);
        assert_eq!(sections[0].items.len(), 2);
        assert_eq!(sections[0].items[0].points, 2);
        assert_eq!(
            sections[0].items[0].name,
            "asks about onset and duration of the presenting complaint"
        );
        assert_eq!(sections[0].items[0].section, "HISTORY TAKING");

        assert_eq!(sections[1].name, "PHYSICAL EXAMINATION");
        assert_eq!(sections[1].items.len(), 1);
        assert_eq!(sections[1].items[0].points, 5);
    }

    #[test]
    fn test_segment_table_items_before_header_ignored() {
        let sheets = table(vec![
            vec![
                "orphan item row appearing before any section header exists",
                "this row has no open section to join",
                "2",
                "x",
            ],
            vec!["MANAGEMENT"],
        ]);

        let (sections, _) = segment_table(&sheets, &PatternLibrary::empty());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "MANAGEMENT");
        assert!(sections[0].items.is_empty());
    }

    #[test]
    fn test_segment_table_inline_points_in_description() {
        let sheets = table(vec![
            vec!["DIAGNOSTIC REASONING"],
            vec![
                "states the most likely diagnosis with justification (3 points)",
                "differential diagnosis discussed with the examiner",
                "notes",
                "more notes",
            ],
        ]);

        let (sections, _) = segment_table(&sheets, &PatternLibrary::empty());
        assert_eq!(sections[0].items.len(), 1);
        assert_eq!(sections[0].items[0].points, 3);
        assert_eq!(
            sections[0].items[0].name,
            "states the most likely diagnosis with justification"
        );
    }

    #[test]
    fn test_segment_table_with_pattern_match() {
        // コーパスに項目として学習済みの行は、ヒューリスティックを迂回して項目になる
        let corpus = CorpusData {
            sheets: table(vec![
                vec!["HISTORY TAKING"],
                vec![
                    "asks about current medications and known allergies today",
                    "complete drug history expected from the candidate",
                    "2",
                    "x",
                ],
            ]),
            templates: Vec::new(),
        };
        let library = PatternLibrary::from_corpus(corpus);
        assert_eq!(library.len(), 2);

        let sheets = table(vec![
            vec!["MEDICATION HISTORY"],
            vec![
                "asks about current medications and known allergies today",
                "complete drug history expected from the candidate",
                "2",
                "x",
            ],
        ]);

        let (sections, matched) = segment_table(&sheets, &library);
        assert!(matched >= 1);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items.len(), 1);
    }

    #[test]
    fn test_segment_table_discards_empty_description() {
        let sheets = table(vec![
            vec!["MANAGEMENT"],
            // 説明に使えるセルがない行
            vec!["--", "•", "2", "no"],
        ]);

        let (sections, _) = segment_table(&sheets, &PatternLibrary::empty());
        assert_eq!(sections.len(), 1);
        assert!(sections[0].items.is_empty());
    }

    #[test]
    fn test_segment_text_numbered_with_points() {
        let text = "1. History Taking (10 points)\nExamples: ask about symptoms, ask about duration";
        let sections = segment_text(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "History Taking");
        assert_eq!(sections[0].max_points, 10);
        assert_eq!(sections[0].confidence_tag, ConfidenceTag::High);
        assert_eq!(sections[0].items.len(), 1);

        let item = &sections[0].items[0];
        assert_eq!(item.id, "History_Taking");
        assert_eq!(item.points, 10);
        assert_eq!(
            item.examples,
            vec!["ask about symptoms".to_string(), "ask about duration".to_string()]
        );
    }

    #[test]
    fn test_segment_text_criteria_prefix() {
        let text = "Criteria 1: Palpation of the abdomen (3 points)\nVerbalization: I am going to press on your belly";
        let sections = segment_text(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Palpation of the abdomen");
        assert_eq!(sections[0].max_points, 3);
        assert_eq!(
            sections[0].items[0].examples,
            vec!["I am going to press on your belly".to_string()]
        );
    }

    #[test]
    fn test_segment_text_bullet_without_points() {
        let sections = segment_text("- Checks capillary refill");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Checks capillary refill");
        // 配点未指定: 項目は1点、節の配点は集計パスで補完される
        assert_eq!(sections[0].max_points, 0);
        assert_eq!(sections[0].items[0].points, 1);
        assert_eq!(sections[0].confidence_tag, ConfidenceTag::Low);
    }

    #[test]
    fn test_segment_text_examples_stop_at_next_criterion() {
        let text = "1. Heart auscultation (2 points)\nExamples: listen to your heart\n2. Lung auscultation (2 points)\nExamples: take a deep breath";
        let sections = segment_text(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].items[0].examples, vec!["listen to your heart"]);
        assert_eq!(sections[1].items[0].examples, vec!["take a deep breath"]);
    }

    #[test]
    fn test_segment_text_multiline_example_harvest() {
        let text = "1. Neurological exam (4 points)\nExamples: follow my finger, squeeze my hands\npush against my hand; relax your arm\n\nunrelated trailing text";
        let sections = segment_text(text);

        let examples = &sections[0].items[0].examples;
        assert_eq!(
            examples,
            &vec![
                "follow my finger".to_string(),
                "squeeze my hands".to_string(),
                "push against my hand".to_string(),
                "relax your arm".to_string(),
            ]
        );
    }

    #[test]
    fn test_segment_text_no_markers_yields_nothing() {
        let sections = segment_text("the patient is a 45 year old presenting with a rash");
        assert!(sections.is_empty());
    }

    #[test]
    fn test_clean_heading() {
        assert_eq!(clean_heading("1. History Taking (10 points)"), "History Taking");
        assert_eq!(clean_heading("- Checks pulse"), "Checks pulse");
        assert_eq!(clean_heading("Physical Examination:"), "Physical Examination");
        assert_eq!(clean_heading("Criteria 2: Palpation 3 pts"), "Palpation");
    }

    #[test]
    fn test_split_phrases() {
        assert_eq!(
            split_phrases("ask about symptoms, ask about duration; ask about severity"),
            vec![
                "ask about symptoms".to_string(),
                "ask about duration".to_string(),
                "ask about severity".to_string(),
            ]
        );
        assert!(split_phrases("  ,  ; ").is_empty());
    }
}
