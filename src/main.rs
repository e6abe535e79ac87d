use clap::Parser;
use rubric_ai_common::{analyze, build_assessment_yaml, flatten_criteria, synthesize_examples};
use rubric_ai_rust::{cache, cli, config, corpus, enhancer, error, input};

use cache::ResponseCache;
use cli::{Cli, Commands};
use config::Config;
use enhancer::Enhancer;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze {
            input: input_path,
            output,
            json,
            corpus: corpus_dir,
            no_enhance,
            use_cache,
        } => {
            println!("📋 rubric-ai - ルーブリック解析\n");

            // 1. コーパス読み込み（プロセスあたり1回）
            println!("[1/4] コーパスを読み込み中...");
            let library = corpus::load_library(corpus_dir.as_deref());
            if library.is_empty() {
                println!("✔ コーパスなし（ルールのみで解析）\n");
            } else {
                println!("✔ {}パターンを収集\n", library.len());
            }

            // 2. 入力読み込み
            println!("[2/4] 入力を読み込み中...");
            let rubric_input = input::read_input(&input_path)?;
            println!("✔ 読み込み完了: {}\n", input_path.display());

            // 3. 解析
            println!("[3/4] 解析中...");
            let mut result = analyze(&rubric_input, library)?;
            println!(
                "✔ {}節 / {}項目を抽出 (合計{}点)\n",
                result.sections.len(),
                result.sections.iter().map(|s| s.items.len()).sum::<usize>(),
                result.total_points
            );

            // 外部補完（設定済みの場合のみ。失敗してもローカル解析で続行）
            let enhancer = Enhancer::new(config)?;
            if enhancer.is_configured() && !no_enhance {
                println!("  外部補完サービスで補強中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
                let original_text = original_text_of(&rubric_input);

                if use_cache {
                    let folder = std::env::current_dir()?;
                    let mut response_cache = ResponseCache::load(&folder);
                    result = enhancer
                        .enhance(result, &original_text, Some(&mut response_cache))
                        .await;
                    response_cache.save(&folder)?;
                } else {
                    result = enhancer.enhance(result, &original_text, None).await;
                }
                println!("✔ 補強完了\n");
            }

            // 4. YAML生成
            println!("[4/4] YAMLプロンプトを生成中...");
            let criteria = flatten_criteria(&result);
            let yaml = build_assessment_yaml(&criteria);

            let yaml_path = output.unwrap_or_else(|| default_yaml_path(&input_path));
            std::fs::write(&yaml_path, &yaml)?;
            println!("✔ YAMLを保存: {}", yaml_path.display());

            if let Some(json_path) = json {
                let json_content = serde_json::to_string_pretty(&result)?;
                std::fs::write(&json_path, json_content)?;
                println!("✔ 解析結果を保存: {}", json_path.display());
            }

            for warning in &result.metadata.warnings {
                println!("⚠ {}", warning);
            }
            if !result.metadata.used_training_corpus {
                println!("⚠ 学習コーパス未使用のため信頼度は低めです");
            }

            println!("\n✅ 解析完了");
        }

        Commands::Render { input: input_path, output } => {
            println!("📄 rubric-ai - YAML再生成\n");

            let content = std::fs::read_to_string(&input_path)?;
            let criteria = parse_criteria_json(&content)?;
            println!("✔ {}項目を読み込み", criteria.len());

            let yaml = build_assessment_yaml(&criteria);
            match output {
                Some(path) => {
                    std::fs::write(&path, &yaml)?;
                    println!("✔ YAMLを保存: {}", path.display());
                }
                None => println!("\n{}", yaml),
            }

            println!("\n✅ 再生成完了");
        }

        Commands::Examples { section, corpus: corpus_dir } => {
            let library = corpus::load_library(corpus_dir.as_deref());
            let examples = synthesize_examples(&section, library);

            println!("発話例 ({}):", section);
            for example in examples {
                println!("  - {}", example);
            }
        }

        Commands::Config {
            set_api_key,
            set_endpoint,
            set_deployment,
            show,
        } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ エンドポイントを設定しました");
            }

            if let Some(deployment) = set_deployment {
                config.set_deployment(deployment)?;
                println!("✔ デプロイメント名を設定しました");
            }

            if show {
                println!("設定:");
                println!("  デプロイメント: {}", config.deployment);
                println!("  APIバージョン: {}", config.api_version);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  抜粋上限: {}文字", config.max_excerpt_chars);
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
                println!("  エンドポイント: {}", config.endpoint.as_deref().unwrap_or("未設定"));
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| std::path::PathBuf::from("."));
            let cache_path = ResponseCache::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = ResponseCache::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match ResponseCache::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// 外部補完へ渡す元テキストを取り出す
fn original_text_of(input: &rubric_ai_common::RubricInput) -> String {
    match input {
        rubric_ai_common::RubricInput::Text(text) => text.clone(),
        rubric_ai_common::RubricInput::Table(sheets) => sheets
            .iter()
            .flat_map(|sheet| sheet.rows.iter())
            .map(|row| {
                row.iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| c.trim())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// デフォルトのYAML出力パス（入力名_prompt.yaml）
fn default_yaml_path(input: &std::path::Path) -> std::path::PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "rubric".to_string());
    input.with_file_name(format!("{}_prompt.yaml", stem))
}

/// 項目リストJSONをパースする
///
/// 解析結果全体（AnalysisResult）と項目配列の両方を受け付ける。
fn parse_criteria_json(content: &str) -> Result<Vec<rubric_ai_common::Criterion>> {
    if let Ok(criteria) = serde_json::from_str::<Vec<rubric_ai_common::Criterion>>(content) {
        return Ok(criteria);
    }

    let result: rubric_ai_common::AnalysisResult = serde_json::from_str(content)?;
    Ok(flatten_criteria(&result))
}
