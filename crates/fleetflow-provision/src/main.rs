mod commands;
mod manifest;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleet-provision")]
#[command(about = "宣言したクラウドリソースを、宣言どおりに。", long_about = None)]
struct Cli {
    /// マニフェストファイル
    #[arg(
        short = 'f',
        long = "file",
        env = "FLEET_PROVISION_FILE",
        default_value = manifest::DEFAULT_MANIFEST,
        global = true
    )]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// マニフェストを検証 (API は呼ばない)
    Validate,
    /// 宣言と state の差分を表示
    Plan {
        /// 差分の前にリモートの状態を取得する
        #[arg(long)]
        refresh: bool,
    },
    /// 差分を適用
    Apply,
    /// 管理中のリソースをすべて削除
    Destroy {
        /// 確認なしで削除する
        #[arg(short, long)]
        yes: bool,
    },
    /// リモートの状態を state に反映
    Refresh,
    /// 既存のリソースを state に取り込む
    Import {
        /// リソースアドレス (<type>.<name>)
        address: String,
        /// リモートの ID (型ごとの形式、例: <cluster-id>/<nodepool-id>@<zone>)
        id: String,
    },
    /// スキーマを表示
    Schema {
        /// リソース型 (省略時は一覧)
        resource_type: Option<String>,
        /// データソースのスキーマを表示する
        #[arg(long)]
        data: bool,
    },
    /// data ブロックを評価
    Read {
        /// 対象のアドレス (<type>.<name>、省略時はすべて)
        address: Option<String>,
        /// JSON で出力する
        #[arg(long)]
        json: bool,
    },
    /// API キーの認証を確認
    Auth,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate => commands::validate::handle(&cli.file),
        Commands::Plan { refresh } => commands::plan::handle(&cli.file, refresh).await,
        Commands::Apply => commands::apply::handle(&cli.file).await,
        Commands::Destroy { yes } => commands::destroy::handle(&cli.file, yes).await,
        Commands::Refresh => commands::refresh::handle(&cli.file).await,
        Commands::Import { address, id } => {
            commands::import::handle(&cli.file, &address, &id).await
        }
        Commands::Schema {
            resource_type,
            data,
        } => commands::schema::handle(resource_type.as_deref(), data),
        Commands::Read { address, json } => {
            commands::read::handle(&cli.file, address.as_deref(), json).await
        }
        Commands::Auth => commands::auth::handle(&cli.file).await,
        Commands::Version => {
            println!("fleet-provision {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
