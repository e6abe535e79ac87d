//! 解析パイプライン
//!
//! セグメンタ→配点集計→発話例合成の順で実行し、AnalysisResultを組み立てる。
//! 外部補完サービスの結果とのマージもここで行う。
//!
//! ## 処理フロー
//! 1. 入力検証（空入力だけが唯一のエラー）
//! 2. セグメンテーション（表 or 自由テキスト）
//! 3. 項目ゼロなら既定の2項目で継続（警告として記録）
//! 4. 配点集計（セグメンテーション完了後に1回だけ）
//! 5. 発話例のない項目を合成で補完

use crate::corpus::PatternLibrary;
use crate::error::{Error, Result};
use crate::segmenter::{segment_table, segment_text};
use crate::synthesizer::synthesize_examples;
use crate::types::{
    derive_exam_id, AnalysisMetadata, AnalysisResult, AnalysisWarning, ConfidenceTag, Criterion,
    RubricInput, Section,
};

/// 既定の節名（どのヒューリスティックでも項目が取れなかったときの下限）
const DEFAULT_SECTION_NAMES: [&str; 2] = ["History Taking", "Physical Examination"];

/// ルーブリック入力を解析する
///
/// 内部の失敗はすべて劣化した結果に吸収され、警告として記録される。
/// エラーになるのは解析対象が何もない場合のみ。
pub fn analyze(input: &RubricInput, library: &PatternLibrary) -> Result<AnalysisResult> {
    if input.is_empty() {
        return Err(Error::InvalidInput);
    }

    let mut warnings = Vec::new();
    let (mut sections, matched_pattern_count) = match input {
        RubricInput::Table(sheets) => segment_table(sheets, library),
        RubricInput::Text(text) => (segment_text(text), 0),
    };

    if sections.iter().all(|s| s.items.is_empty()) {
        sections = default_sections(library);
        warnings.push(AnalysisWarning::NoCriteriaExtracted);
    }

    let mut result = AnalysisResult {
        sections,
        total_points: 0,
        metadata: AnalysisMetadata {
            matched_pattern_count,
            used_training_corpus: !library.is_empty(),
            warnings,
        },
    };

    aggregate_points(&mut result);
    fill_missing_examples(&mut result, library);

    Ok(result)
}

/// 配点の集計パス
///
/// 配点が0のままの節は項目の合計で補完し、total_pointsを全節の合計で
/// 再計算する。再実行しても結果は変わらない（増分更新はしない）。
pub fn aggregate_points(result: &mut AnalysisResult) {
    for section in &mut result.sections {
        if section.max_points == 0 {
            section.max_points = section.items.iter().map(|i| i.points).sum();
        }
    }

    result.total_points = result.sections.iter().map(|s| s.max_points).sum();
}

/// 発話例のない項目をシンセサイザで補完する
fn fill_missing_examples(result: &mut AnalysisResult, library: &PatternLibrary) {
    for section in &mut result.sections {
        for item in &mut section.items {
            if item.examples.is_empty() {
                item.examples = synthesize_examples(&section.name, library);
            }
        }
    }
}

/// 既定の2項目（医療面接の汎用セット）
fn default_sections(library: &PatternLibrary) -> Vec<Section> {
    DEFAULT_SECTION_NAMES
        .iter()
        .map(|name| {
            let item = Criterion {
                id: derive_exam_id(name),
                name: name.to_string(),
                description: name.to_string(),
                points: 1,
                examples: synthesize_examples(name, library),
                section: name.to_string(),
            };
            Section {
                name: name.to_string(),
                max_points: 0,
                items: vec![item],
                confidence_tag: ConfidenceTag::Low,
            }
        })
        .collect()
}

/// ローカル解析と外部補完結果をマージする
///
/// - 節は小文字化した名前で突き合わせ、両方にある節は項目をマージ
/// - 項目は小文字化した説明で突き合わせ、発話例は長い方を採用、
///   配点はローカルに無い（0の）場合だけ外部値で埋める
/// - 外部にしかない節はそのまま追加
/// - total_points は max(ローカル, 外部)。再集計はしない（観測された挙動の保存）
pub fn merge_analyses(local: AnalysisResult, external: AnalysisResult) -> AnalysisResult {
    let external_total = external.total_points;
    let mut merged = local;

    for ext_section in external.sections {
        let key = ext_section.name.to_lowercase();
        match merged
            .sections
            .iter_mut()
            .find(|s| s.name.to_lowercase() == key)
        {
            Some(section) => {
                for ext_item in ext_section.items {
                    let item_key = ext_item.description.to_lowercase();
                    match section
                        .items
                        .iter_mut()
                        .find(|i| i.description.to_lowercase() == item_key)
                    {
                        Some(item) => {
                            if ext_item.examples.len() > item.examples.len() {
                                item.examples = ext_item.examples;
                            }
                            if item.points == 0 {
                                item.points = ext_item.points;
                            }
                        }
                        None => section.items.push(ext_item),
                    }
                }
            }
            None => merged.sections.push(ext_section),
        }
    }

    merged.total_points = merged.total_points.max(external_total);
    merged
}

/// 全節の項目を元の順序で平坦化する
pub fn flatten_criteria(result: &AnalysisResult) -> Vec<Criterion> {
    result
        .sections
        .iter()
        .flat_map(|s| s.items.iter().cloned())
        .collect()
}
