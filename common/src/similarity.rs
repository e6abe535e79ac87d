//! 類似度スコアラー
//!
//! 入力行とコーパス由来パターンの類似度を [0, 1] で算出する。
//! 完全一致 1.0 > 包含 0.7 > 単語重なり、列数一致で +0.2 ボーナス。

use crate::types::Pattern;

/// ベストマッチ採用の閾値（この値ちょうどは不採用）
pub const MATCH_THRESHOLD: f64 = 0.5;

/// 列数一致ボーナス
const COLUMN_BONUS: f64 = 0.2;

/// 入力行とパターンの類似度を計算する
pub fn similarity_score(text: &str, column_count: usize, pattern: &Pattern) -> f64 {
    let input = text.trim().to_lowercase();
    let sample = pattern.text_sample.trim().to_lowercase();

    let base = if input == sample {
        1.0
    } else if input.contains(&sample) || sample.contains(&input) {
        0.7
    } else {
        word_overlap(&input, &sample)
    };

    let score = if column_count == pattern.column_shape.len() {
        base + COLUMN_BONUS
    } else {
        base
    };

    score.min(1.0)
}

/// 共有単語数 / max(入力の単語数, パターンの単語数)
fn word_overlap(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let shared = words_a.intersection(&words_b).count();
    shared as f64 / words_a.len().max(words_b.len()) as f64
}

/// 全パターン中のベストマッチを返す
///
/// スコアが閾値を超えた（strictly greater）場合のみ採用。
/// 同点は最初に最大へ到達したパターンが勝つ（収集順で安定）。
pub fn best_match<'a>(
    text: &str,
    column_count: usize,
    patterns: &'a [Pattern],
) -> Option<&'a Pattern> {
    let mut best: Option<&Pattern> = None;
    let mut best_score = 0.0_f64;

    for pattern in patterns {
        let score = similarity_score(text, column_count, pattern);
        if score > best_score {
            best = Some(pattern);
            best_score = score;
        }
    }

    if best_score > MATCH_THRESHOLD {
        best
    } else {
        None
    }
}
