//! プロンプト生成モジュール
//!
//! - build_assessment_yaml: 採点項目リストから評価用YAMLプロンプトを生成
//! - build_enhancement_prompt: 外部補完サービスへ送る指示文を生成
//!
//! YAMLは固定テンプレートの決定的な出力で、同じ入力に対して
//! バイト単位で同一の文書を返す（タイムスタンプや乱数を含めない）。

use crate::types::{AnalysisResult, Criterion};

/// ステーションキーの既定値
pub const DEFAULT_STATION_KEY: &str = "1A";

/// 採点項目リストから評価用YAMLプロンプトを生成する
///
/// 手動編集済みの項目リストをそのまま渡して再生成する用途にも使う。
pub fn build_assessment_yaml(criteria: &[Criterion]) -> String {
    let exam_list = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "   {}. {}: Did the doctor perform {}? - Verbalization examples: {}",
                i + 1,
                c.id,
                c.name.to_lowercase(),
                c.examples.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let keys = criteria
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let max_points = criteria.iter().map(|c| c.points).max().unwrap_or(1);

    format!(
        r#"key:
  {key}
system_message:
  |
   You are a helpful assistant tasked with analyzing and scoring a recorded medical examination between a medical student and a patient. Provide your response in JSON format.

user_message:
  |
   Important Instruction:
   When determining the start and end times of each examination, focus on the moments where the doctor instructs the patient to perform an action (e.g., "look up at the ceiling", "look straight ahead"). Give these phrases priority for setting the `start_time` and `end_time` over phrases where the doctor states their own actions (e.g., "I'm going to look at your nose and eyes").

   You need to identify the following physical exams from this conversation:
{exam_list}

   If no exam is detected, you can say "No exam was performed", start_time: "nan", end_time: "nan", score: 0.

   # Formatting instructions

   - Ensure strict adherence to JSON formatting.
   - Do not use double quotes for multiple statements within a single field.
   - Use commas, single quotes, or other appropriate delimiters for multiple statements.
   - Do not include any text before or after the JSON output. Provide ONLY the json response.

   Please provide a response in the following format with keys: {keys}

   and the schema:
   {{
        "statement": "statement extracted from the conversation that supports this specific exam",
        "start_time": "timepoint for start of the exam (ONLY 1 decimal pt)",
        "end_time": "timepoint for end of the exam (ONLY 1 decimal pt)",
        "rationale": "reasoning behind scoring the physical exam",
        "score": "score of the exam (0 to {max_points})"
   }}
response_config:
  structured_output: True
"#,
        key = DEFAULT_STATION_KEY,
        exam_list = exam_list,
        keys = keys,
        max_points = max_points,
    )
}

/// 外部補完サービスへ送るプロンプトを生成する
///
/// ローカル解析のJSONと元テキストの抜粋を渡し、同じ形のJSONオブジェクトを
/// 返すよう指示する。レスポンスはparse_enhancement_responseで受ける。
pub fn build_enhancement_prompt(local: &AnalysisResult, excerpt: &str) -> String {
    let local_json = serde_json::to_string_pretty(local).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are an expert medical educator reviewing OSCE assessment criteria.

A preliminary pattern-based analysis of a grading rubric is given below, together with an excerpt of the original rubric text. Improve the analysis: add missed criteria, fill in missing point values, and supply verbalization examples a student might say while performing each criterion.

Return ONLY a JSON object with this exact shape (no markdown, no commentary):
{{
  "sections": [
    {{
      "name": "section name",
      "maxPoints": 0,
      "confidenceTag": "high",
      "items": [
        {{
          "id": "Derived_Id",
          "name": "criterion name",
          "description": "criterion description",
          "points": 0,
          "examples": ["verbalization example"],
          "section": "section name"
        }}
      ]
    }}
  ],
  "totalPoints": 0,
  "metadata": {{"matchedPatternCount": 0, "usedTrainingCorpus": false, "warnings": []}}
}}

Preliminary analysis:
{local_json}

Rubric text excerpt:
{excerpt}"#,
    )
}
