//! 外部サービスレスポンスパーサー
//!
//! 補完サービスのレスポンスからJSONを抽出し、AnalysisResultへ変換する。
//! 欠損フィールドはserdeのデフォルトで補い、境界でIDと節参照を補完して
//! 後段のマージが型安全に動くようにする。

use crate::error::{Error, Result};
use crate::types::{derive_exam_id, AnalysisResult};

/// レスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. 生の [...] 配列
/// 4. エラー
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 生の {...} を探す
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    // 生の [...] を探す
    if let Some(start) = response.find('[') {
        if let Some(end) = response.rfind(']') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("no JSON payload found in response".into()))
}

/// 補完サービスのレスポンスをAnalysisResultへパース
///
/// IDが空の項目は名前から導出し直し、節参照が空の項目には所属節名を
/// 書き戻す（境界での正規化）。
pub fn parse_enhancement_response(response: &str) -> Result<AnalysisResult> {
    let json_str = extract_json(response)?;
    let mut result: AnalysisResult = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("enhancement JSON parse failed: {}", e)))?;

    for section in &mut result.sections {
        for item in &mut section.items {
            if item.id.is_empty() {
                item.id = derive_exam_id(&item.name);
            }
            if item.section.is_empty() {
                item.section = section.name.clone();
            }
            if item.description.is_empty() {
                item.description = item.name.clone();
            }
        }
    }

    Ok(result)
}
