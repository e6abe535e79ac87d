//! Rubric AI Common Library
//!
//! ルーブリック解析パイプラインの共有ロジック。
//! ファイルシステムやネットワークには触れず、CLI側から
//! コーパスと入力を注入して使う。

pub mod analyzer;
pub mod classifier;
pub mod corpus;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod segmenter;
pub mod similarity;
pub mod synthesizer;
pub mod types;

pub use analyzer::{aggregate_points, analyze, flatten_criteria, merge_analyses};
pub use classifier::{classify_line, parse_inline_points, LineRole};
pub use corpus::{CorpusData, CorpusSource, InMemoryCorpus, PatternLibrary, TemplateDoc};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_enhancement_response};
pub use prompts::{build_assessment_yaml, build_enhancement_prompt};
pub use segmenter::{segment_table, segment_text};
pub use similarity::{best_match, similarity_score};
pub use synthesizer::{synthesize_examples, MAX_EXAMPLES};
pub use types::{
    derive_exam_id, AnalysisMetadata, AnalysisResult, AnalysisWarning, ConfidenceTag, Criterion,
    Pattern, PatternKind, RubricInput, Section, SheetTable,
};
