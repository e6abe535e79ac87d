use thiserror::Error;

#[derive(Error, Debug)]
pub enum RubricAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`rubric-ai config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    #[error("エンドポイントが設定されていません。`rubric-ai config --set-endpoint URL` で設定してください")]
    MissingEndpoint,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("未対応のファイル形式: {0}")]
    UnsupportedFormat(String),

    #[error("スプレッドシート読み込みエラー: {0}")]
    Spreadsheet(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析エラー: {0}")]
    Pipeline(#[from] rubric_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, RubricAiError>;
