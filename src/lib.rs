//! rubric-ai CLIのモジュール群
//!
//! 解析パイプライン本体は rubric-ai-common 側にあり、ここでは
//! 入出力・コーパス探索・設定・外部補完の各関心を受け持つ。

pub mod cache;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod enhancer;
pub mod error;
pub mod input;
