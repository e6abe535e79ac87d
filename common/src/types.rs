//! 解析結果の型定義
//!
//! CLIと外部補完サービスの境界で共有される型:
//! - Pattern: コーパスから学習した構造パターン
//! - Section / Criterion: ルーブリックの節と採点項目
//! - AnalysisResult: 最終出力（解析メタデータ込み）

use serde::{Deserialize, Serialize};

/// パターンの構造上の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    SectionHeader,
    Item,
}

/// コーパスの1行から学習した構造パターン
///
/// 読み込み後は不変。リクエスト処理中に変更されることはない。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub kind: PatternKind,
    /// 行テキストのサンプル
    pub text_sample: String,
    /// 非空セルの並び
    pub column_shape: Vec<String>,
    /// 由来シート名
    pub source_sheet: String,
}

/// スプレッドシート1枚分の行データ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetTable {
    pub sheet_name: String,
    pub rows: Vec<Vec<String>>,
}

/// 解析パイプラインへの入力
#[derive(Debug, Clone)]
pub enum RubricInput {
    /// 抽出済みの生テキスト
    Text(String),
    /// 構造化された表データ
    Table(Vec<SheetTable>),
}

impl RubricInput {
    /// 解析可能な内容を含まないか判定
    pub fn is_empty(&self) -> bool {
        match self {
            RubricInput::Text(text) => text.trim().is_empty(),
            RubricInput::Table(sheets) => sheets.iter().all(|sheet| {
                sheet
                    .rows
                    .iter()
                    .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
            }),
        }
    }
}

/// 節の信頼度タグ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTag {
    High,
    #[default]
    Low,
}

/// 採点項目（1つのスコア対象）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Criterion {
    /// 名前から導出したID（同一実行内での衝突は許容）
    pub id: String,
    pub name: String,
    pub description: String,
    /// 配点（明示されない場合は1）
    pub points: u32,
    /// 発話例
    pub examples: Vec<String>,
    /// 所属する節の名前（弱参照）
    pub section: String,
}

/// 採点項目をまとめる節
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub name: String,
    /// 配点合計（ヘッダに明示がなければ集計パスで項目から補完）
    pub max_points: u32,
    pub items: Vec<Criterion>,
    pub confidence_tag: ConfidenceTag,
}

/// 非致命的な劣化の記録
///
/// ログに流すのではなく結果に載せて呼び出し側から観測できるようにする。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum AnalysisWarning {
    /// コーパスが見つからない（ルールのみで続行）
    CorpusUnavailable(String),
    /// どのヒューリスティックでも項目が抽出できなかった（既定の項目で続行）
    NoCriteriaExtracted,
    /// 外部補完サービスの失敗（ローカル解析をそのまま返す）
    ExternalServiceFailure(String),
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisWarning::CorpusUnavailable(detail) => {
                write!(f, "corpus unavailable: {}", detail)
            }
            AnalysisWarning::NoCriteriaExtracted => {
                write!(f, "no criteria extracted, default criteria used")
            }
            AnalysisWarning::ExternalServiceFailure(detail) => {
                write!(f, "external enhancement failed: {}", detail)
            }
        }
    }
}

/// 解析メタデータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisMetadata {
    /// 類似度マッチしたパターン数
    pub matched_pattern_count: usize,
    /// 学習コーパスを利用したか
    pub used_training_corpus: bool,
    /// 非致命的な劣化の一覧
    pub warnings: Vec<AnalysisWarning>,
}

/// 解析結果（リクエストごとに新規生成、永続化なし）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub sections: Vec<Section>,
    /// 全節のmax_pointsの合計（集計パスで毎回再計算する）
    pub total_points: u32,
    pub metadata: AnalysisMetadata,
}

/// 項目名から決定的にIDを導出する
///
/// 英数字以外を落とし、空白をアンダースコアに畳む。
/// 同一実行内での衝突は既知の弱点としてそのまま許容する。
pub fn derive_exam_id(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_exam_id_basic() {
        assert_eq!(derive_exam_id("History Taking"), "History_Taking");
        assert_eq!(derive_exam_id("Checks pulse"), "Checks_pulse");
    }

    #[test]
    fn test_derive_exam_id_strips_punctuation() {
        assert_eq!(derive_exam_id("Palpation (deep)!"), "Palpation_deep");
        assert_eq!(derive_exam_id("  spaced   out  "), "spaced_out");
    }

    #[test]
    fn test_derive_exam_id_collision_tolerated() {
        // 記号違いの名前が同じIDに潰れる（既知の弱点）
        assert_eq!(derive_exam_id("Heart-Sounds"), derive_exam_id("Heart Sounds"));
    }

    #[test]
    fn test_rubric_input_is_empty() {
        assert!(RubricInput::Text("   \n ".to_string()).is_empty());
        assert!(!RubricInput::Text("History Taking".to_string()).is_empty());

        let blank_table = RubricInput::Table(vec![SheetTable {
            sheet_name: "Sheet1".to_string(),
            rows: vec![vec!["".to_string(), " ".to_string()]],
        }]);
        assert!(blank_table.is_empty());

        let table = RubricInput::Table(vec![SheetTable {
            sheet_name: "Sheet1".to_string(),
            rows: vec![vec!["HISTORY TAKING".to_string()]],
        }]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_analysis_result_serialize_camel_case() {
        let result = AnalysisResult {
            sections: vec![Section {
                name: "History Taking".to_string(),
                max_points: 10,
                items: vec![Criterion {
                    id: "History_Taking".to_string(),
                    name: "History Taking".to_string(),
                    points: 10,
                    ..Default::default()
                }],
                confidence_tag: ConfidenceTag::High,
            }],
            total_points: 10,
            metadata: AnalysisMetadata {
                matched_pattern_count: 2,
                used_training_corpus: true,
                warnings: Vec::new(),
            },
        };

        let json = serde_json::to_string(&result).expect("シリアライズ失敗");
        assert!(json.contains("\"totalPoints\":10"));
        assert!(json.contains("\"maxPoints\":10"));
        assert!(json.contains("\"matchedPatternCount\":2"));
        assert!(json.contains("\"usedTrainingCorpus\":true"));
        assert!(json.contains("\"confidenceTag\":\"high\""));
    }

    #[test]
    fn test_analysis_result_deserialize_missing_fields() {
        // 外部サービスの応答は欠損があり得るため、全フィールドがデフォルト補完される
        let json = r#"{"sections": [{"name": "Management", "items": [{"name": "Explains plan"}]}]}"#;

        let result: AnalysisResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].name, "Management");
        assert_eq!(result.sections[0].max_points, 0);
        assert_eq!(result.sections[0].confidence_tag, ConfidenceTag::Low);
        assert_eq!(result.sections[0].items[0].points, 0);
        assert_eq!(result.total_points, 0);
        assert!(!result.metadata.used_training_corpus);
    }

    #[test]
    fn test_analysis_warning_roundtrip() {
        let warnings = vec![
            AnalysisWarning::CorpusUnavailable("no directory".to_string()),
            AnalysisWarning::NoCriteriaExtracted,
            AnalysisWarning::ExternalServiceFailure("timeout".to_string()),
        ];

        let json = serde_json::to_string(&warnings).expect("シリアライズ失敗");
        let restored: Vec<AnalysisWarning> = serde_json::from_str(&json).expect("デシリアライズ失敗");
        assert_eq!(warnings, restored);
    }
}
