mod commands;
mod providers;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "ノードの前に、ロケーションごとのロードバランサーを。", long_about = None)]
struct Cli {
    /// デバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// プロバイダーの認証状態を確認
    Auth,
    /// ノードの一覧を表示
    Nodes {
        /// グループで絞り込む
        #[arg(short, long)]
        group: Option<String>,
        /// タグで絞り込む
        #[arg(short, long)]
        tag: Option<String>,
        /// 削除済みのノードも表示
        #[arg(short, long)]
        all: bool,
    },
    /// ロードバランサーを管理
    #[command(subcommand)]
    Lb(LbCommands),
    /// バージョン情報を表示
    Version,
}

/// ロードバランサーのサブコマンド
#[derive(Subcommand)]
enum LbCommands {
    /// 対象ノードのロケーションごとにロードバランサーを作成
    Create {
        /// ロードバランサー名
        name: String,
        /// プロトコル (HTTP / TCP)
        #[arg(short, long, default_value = "HTTP")]
        protocol: String,
        /// ロードバランサーが待ち受けるポート
        #[arg(long, default_value_t = 80)]
        port: u16,
        /// ノード側のポート
        #[arg(long)]
        instance_port: Option<u16>,
        /// 対象ノードのグループ
        #[arg(short, long)]
        group: Option<String>,
        /// 対象ノードのタグ
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// アドレスを指定してロードバランサーを削除
    Destroy {
        /// ロードバランサーのアドレス
        address: IpAddr,
    },
    /// 作成済みのロードバランサーを表示
    List,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("nimbus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let project_root = std::env::current_dir()?;

    // lb list は state だけを読む
    if matches!(cli.command, Commands::Lb(LbCommands::List)) {
        return commands::lb::list(&project_root).await;
    }

    let (config_path, config) = match nimbus_config::load_config() {
        Ok(loaded) => loaded,
        Err(e @ nimbus_config::ConfigError::ConfigFileNotFound) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("設定ファイルの読み込みに失敗しました"),
    };
    tracing::debug!("Loaded config: {}", config_path.display());

    let providers = providers::build(&config)?;

    match cli.command {
        Commands::Auth => {
            commands::auth::handle(&providers).await?;
        }
        Commands::Nodes { group, tag, all } => {
            commands::nodes::handle(providers.compute.as_ref(), group, tag, all).await?;
        }
        Commands::Lb(LbCommands::Create {
            name,
            protocol,
            port,
            instance_port,
            group,
            tag,
        }) => {
            let args = commands::lb::CreateArgs {
                name,
                protocol,
                port,
                instance_port: instance_port.unwrap_or(port),
                group,
                tag,
            };
            commands::lb::create(&providers, &project_root, args).await?;
        }
        Commands::Lb(LbCommands::Destroy { address }) => {
            commands::lb::destroy(&providers, &project_root, address).await?;
        }
        Commands::Lb(LbCommands::List) => {
            unreachable!("lb list is handled before config loading");
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
