use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rubric-ai")]
#[command(about = "OSCE採点ルーブリック解析・評価プロンプト生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ルーブリックファイルを解析してYAMLプロンプトを生成
    Analyze {
        /// 入力ファイル（.txt / .csv / .xlsx / .xls）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力YAMLファイル（デフォルト: 入力名_prompt.yaml）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        json: Option<PathBuf>,

        /// コーパスディレクトリ（省略時は候補パスを順に探索）
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// 外部補完サービスを使わない（設定済みでもスキップ）
        #[arg(long)]
        no_enhance: bool,

        /// 外部補完レスポンスのキャッシュを使用
        #[arg(long)]
        use_cache: bool,
    },

    /// 編集済みの項目リストからYAMLプロンプトを再生成
    Render {
        /// 項目リストJSON（解析結果全体でも項目配列でも可）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力YAMLファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 節名から発話例を合成して表示
    Examples {
        /// 節名（例: "History Taking"）
        #[arg(required = true)]
        section: String,

        /// コーパスディレクトリ
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 補完サービスのエンドポイントを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// デプロイメント名を設定
        #[arg(long)]
        set_deployment: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
