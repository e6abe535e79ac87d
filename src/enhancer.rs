//! 外部補完アダプタ
//!
//! パターンベースの解析結果と元テキストの抜粋を外部の補完サービス
//! （Azure OpenAI互換のchat completionsエンドポイント）へ送り、
//! 返ってきた同形のJSONをローカル解析へマージする。
//!
//! フェイルオープン: 資格情報がなければ何もせず、呼び出しやパースが
//! 失敗した場合もローカル解析を警告付きでそのまま返す。

use crate::cache::{prompt_digest, ResponseCache};
use crate::config::Config;
use crate::error::{Result, RubricAiError};
use rubric_ai_common::{
    build_enhancement_prompt, merge_analyses, parse_enhancement_response, AnalysisResult,
    AnalysisWarning,
};
use serde_json::json;
use std::time::Duration;

pub struct Enhancer {
    client: reqwest::Client,
    config: Config,
}

impl Enhancer {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RubricAiError::ApiCall(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 外部補完が利用可能か
    pub fn is_configured(&self) -> bool {
        self.config.enhancement_available()
    }

    /// ローカル解析を外部サービスで補強する
    ///
    /// 未設定なら入力をそのまま返す。失敗時はマージをスキップし、
    /// ExternalServiceFailure警告を付けたローカル解析を返す。
    pub async fn enhance(
        &self,
        local: AnalysisResult,
        original_text: &str,
        mut cache: Option<&mut ResponseCache>,
    ) -> AnalysisResult {
        if !self.is_configured() {
            return local;
        }

        let excerpt = bounded_excerpt(original_text, self.config.max_excerpt_chars);
        let prompt = build_enhancement_prompt(&local, excerpt);
        let digest = prompt_digest(&prompt);

        let cached = cache
            .as_deref()
            .and_then(|c| c.get(&digest))
            .map(str::to_string);

        let response = match cached {
            Some(response) => response,
            None => match self.call_completion(&prompt).await {
                Ok(response) => {
                    if let Some(cache) = cache.as_deref_mut() {
                        cache.insert(
                            digest,
                            self.config.get_deployment(),
                            response.clone(),
                        );
                    }
                    response
                }
                Err(e) => return with_failure_warning(local, e.to_string()),
            },
        };

        match parse_enhancement_response(&response) {
            Ok(external) => merge_analyses(local, external),
            Err(e) => with_failure_warning(local, e.to_string()),
        }
    }

    /// chat completionsエンドポイントを呼び出す
    async fn call_completion(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.get_api_key()?;
        let endpoint = self.config.get_endpoint()?;
        let deployment = self.config.get_deployment();

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            self.config.api_version,
        );

        let body = json!({
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert at converting medical assessment rubrics into structured assessment criteria. Respond with a single JSON object."
                },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": 2000,
            "temperature": 0.3
        });

        let response = self
            .client
            .post(&url)
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RubricAiError::ApiCall(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RubricAiError::ApiCall(format!(
                "status {}: {}",
                status, text
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RubricAiError::ApiParse(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                RubricAiError::ApiParse("レスポンスにcontentがありません".to_string())
            })
    }
}

/// 失敗を警告としてローカル解析に記録する
fn with_failure_warning(mut local: AnalysisResult, detail: String) -> AnalysisResult {
    local
        .metadata
        .warnings
        .push(AnalysisWarning::ExternalServiceFailure(detail));
    local
}

/// 文字境界を壊さずに先頭から抜粋する
fn bounded_excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
