//! 学習コーパスとパターンライブラリ
//!
//! コーパス（過去のルーブリックスプレッドシートとテンプレート文書）から
//! 行パターンを収集し、読み取り専用のライブラリとして保持する。
//! 取得元は `CorpusSource` として注入し、テストでは固定のメモリ上
//! コーパスに差し替えられるようにする。

use crate::classifier::{classify_line, LineRole};
use crate::error::Result;
use crate::types::{AnalysisWarning, Pattern, PatternKind, SheetTable};

/// 発話例の採取元となるテンプレート文書
#[derive(Debug, Clone, Default)]
pub struct TemplateDoc {
    pub name: String,
    pub text: String,
}

/// コーパス一式（スプレッドシート + テンプレート文書）
#[derive(Debug, Clone, Default)]
pub struct CorpusData {
    pub sheets: Vec<SheetTable>,
    pub templates: Vec<TemplateDoc>,
}

/// コーパス取得元
pub trait CorpusSource {
    fn load(&self) -> Result<CorpusData>;
}

/// 固定のメモリ上コーパス（テスト用）
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    pub data: CorpusData,
}

impl CorpusSource for InMemoryCorpus {
    fn load(&self) -> Result<CorpusData> {
        Ok(self.data.clone())
    }
}

/// 読み込み後は不変のパターンライブラリ
///
/// プロセス内で共有される唯一の長寿命状態。変更操作は提供しない。
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
    templates: Vec<TemplateDoc>,
}

impl PatternLibrary {
    /// 空のライブラリ（ルールのみで動作する劣化モード）
    pub fn empty() -> Self {
        Self::default()
    }

    /// コーパスからパターンを収集する
    ///
    /// 各シートの非空行を分類し、ヘッダ/項目に該当した行だけを
    /// パターンとして保持する。どちらにも該当しない行は捨てる。
    pub fn from_corpus(data: CorpusData) -> Self {
        let mut patterns = Vec::new();

        for sheet in &data.sheets {
            for row in &sheet.rows {
                let non_empty: Vec<String> = row
                    .iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                if non_empty.is_empty() {
                    continue;
                }

                let text = non_empty.join(" | ");
                let kind = match classify_line(&text, row) {
                    Some(LineRole::SectionHeader) => PatternKind::SectionHeader,
                    Some(LineRole::Item) => PatternKind::Item,
                    None => continue,
                };

                patterns.push(Pattern {
                    kind,
                    text_sample: text,
                    column_shape: non_empty,
                    source_sheet: sheet.sheet_name.clone(),
                });
            }
        }

        Self {
            patterns,
            templates: data.templates,
        }
    }

    /// 取得元からライブラリを構築する（ベストエフォート）
    ///
    /// 取得失敗は警告に変換し、空のライブラリで続行する。
    pub fn from_source(source: &dyn CorpusSource) -> (Self, Vec<AnalysisWarning>) {
        match source.load() {
            Ok(data) => {
                let library = Self::from_corpus(data);
                if library.is_empty() {
                    let warning = AnalysisWarning::CorpusUnavailable(
                        "corpus contained no usable patterns or templates".to_string(),
                    );
                    (library, vec![warning])
                } else {
                    (library, Vec::new())
                }
            }
            Err(e) => (
                Self::empty(),
                vec![AnalysisWarning::CorpusUnavailable(e.to_string())],
            ),
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn templates(&self) -> &[TemplateDoc] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.templates.is_empty()
    }

    /// 収集済みパターン数
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
