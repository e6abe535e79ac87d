//! コーパスディレクトリ探索モジュール
//!
//! 過去のルーブリック（スプレッドシート）とテンプレート文書を
//! ファイルシステムから収集し、パターンライブラリを構築する。
//! 読み込みはプロセスあたり最大1回（single-flight）。

use crate::input::read_spreadsheet;
use once_cell::sync::OnceCell;
use rubric_ai_common::{
    AnalysisWarning, CorpusData, CorpusSource, PatternLibrary, TemplateDoc,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// コーパス候補ディレクトリ（先に存在したものが勝つ）
const CORPUS_CANDIDATE_DIRS: &[&str] = &["corpus", "training", "rubrics/corpus"];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm"];
const TEMPLATE_EXTENSIONS: &[&str] = &["txt", "md"];

/// ファイルシステム上のコーパス取得元
#[derive(Debug, Clone, Default)]
pub struct FsCorpus {
    root: Option<PathBuf>,
}

impl FsCorpus {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// コーパスディレクトリを解決する
    ///
    /// 明示指定 → 候補ディレクトリ → ユーザーデータディレクトリの順。
    fn resolve_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.root {
            return root.exists().then(|| root.clone());
        }

        for candidate in CORPUS_CANDIDATE_DIRS {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        dirs::data_dir()
            .map(|d| d.join("rubric-ai").join("corpus"))
            .filter(|p| p.exists())
    }
}

impl CorpusSource for FsCorpus {
    fn load(&self) -> rubric_ai_common::Result<CorpusData> {
        let root = self.resolve_root().ok_or_else(|| {
            rubric_ai_common::Error::Config("コーパスディレクトリが見つかりません".into())
        })?;

        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.into_path())
            .collect();
        // パターン収集順を安定させる
        files.sort();

        let mut data = CorpusData::default();

        for path in files {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();

            if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
                match read_spreadsheet(&path) {
                    Ok(sheets) => data.sheets.extend(sheets),
                    Err(e) => {
                        // 壊れたファイルは飛ばして続行（ベストエフォート）
                        eprintln!("⚠ コーパスファイルをスキップ: {}: {}", path.display(), e);
                    }
                }
            } else if TEMPLATE_EXTENSIONS.contains(&ext.as_str()) {
                match std::fs::read_to_string(&path) {
                    Ok(text) => data.templates.push(TemplateDoc {
                        name: path
                            .file_stem()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default(),
                        text,
                    }),
                    Err(e) => {
                        eprintln!("⚠ コーパスファイルをスキップ: {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(data)
    }
}

static LIBRARY: OnceCell<PatternLibrary> = OnceCell::new();

/// パターンライブラリを取得する（プロセスあたり1回だけ読み込み）
///
/// 読み込み時の警告は標準エラーに出し、ライブラリ自体は常に返す
/// （コーパスがなければ空のライブラリでルールのみの動作になる）。
pub fn load_library(root: Option<&Path>) -> &'static PatternLibrary {
    LIBRARY.get_or_init(|| {
        let source = FsCorpus::new(root.map(Path::to_path_buf));
        let (library, warnings) = PatternLibrary::from_source(&source);
        for warning in &warnings {
            if let AnalysisWarning::CorpusUnavailable(detail) = warning {
                eprintln!("⚠ コーパスなしで続行します: {}", detail);
            }
        }
        library
    })
}
