use crate::error::{Result, RubricAiError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: String,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub max_excerpt_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            deployment: "gpt-4o-mini".into(),
            api_version: "2024-02-15-preview".into(),
            timeout_seconds: 60, // ぶら下がり防止（タイムアウト＝サービス利用不可として扱う）
            max_excerpt_chars: 4000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RubricAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("rubric-ai").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var("AZURE_OPENAI_KEY") {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(RubricAiError::MissingApiKey)
    }

    pub fn get_endpoint(&self) -> Result<String> {
        if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                return Ok(endpoint);
            }
        }

        self.endpoint.clone().ok_or(RubricAiError::MissingEndpoint)
    }

    pub fn get_deployment(&self) -> String {
        std::env::var("AZURE_OPENAI_DEPLOYMENT_NAME").unwrap_or_else(|_| self.deployment.clone())
    }

    /// 外部補完が利用可能か（キーとエンドポイントの両方が必要）
    pub fn enhancement_available(&self) -> bool {
        self.get_api_key().is_ok() && self.get_endpoint().is_ok()
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        self.endpoint = Some(endpoint);
        self.save()
    }

    pub fn set_deployment(&mut self, deployment: String) -> Result<()> {
        self.deployment = deployment;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(config.endpoint.is_none());
        assert_eq!(config.deployment, "gpt-4o-mini");
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.max_excerpt_chars, 4000);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{"deployment": "gpt-4o"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.deployment, "gpt-4o");
        assert_eq!(config.timeout_seconds, 60); // デフォルト値
    }
}
