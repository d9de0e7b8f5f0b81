// パス: src/bin/pausepoint.rs
// 役割: Demo host that pauses on a sample namespace and opens the console
// 意図: Offer a CLI executable for trying the console against live state
// 関連ファイル: src/console/session.rs, src/config.rs, src/lib.rs
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pausepoint::config::ConsoleConfig;
use pausepoint::script::standard_namespace;
use pausepoint::value::{format_value, Object, Value};
use pausepoint::Namespace;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "pausepoint",
    version,
    about = "Pause a demo host and inspect its namespace interactively"
)]
struct Cli {
    /// JSON 形式の設定ファイル。
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// プロンプト文字列を上書きする。
    #[arg(long)]
    prompt: Option<String>,
    /// 入力行のハイライトを無効にする。
    #[arg(long)]
    no_color: bool,
    /// 履歴ファイルの場所を上書きする。
    #[arg(long, value_name = "PATH")]
    history_file: Option<PathBuf>,
    /// ログを詳しくする（-v で debug、-vv で trace）。
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let ns = demo_namespace();
    println!("ホスト: counter = {}", show(&ns, "counter"));
    if let Err(err) = pausepoint::pause(&ns, &config) {
        eprintln!("コンソール実行中にエラーが発生しました: {}", err);
        return ExitCode::FAILURE;
    }
    println!("ホスト: counter = {}", show(&ns, "counter"));
    ExitCode::SUCCESS
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// 既定値 < 設定ファイル < 環境変数 < コマンドライン の順で設定を組み立てる。
fn load_config(cli: &Cli) -> Result<ConsoleConfig, pausepoint::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    }
    .with_env_overrides();
    if let Some(prompt) = &cli.prompt {
        config.prompt = prompt.clone();
    }
    if cli.no_color {
        config.color = false;
    }
    if let Some(path) = &cli.history_file {
        config.history_file = Some(path.clone());
    }
    Ok(config)
}

/// 一時停止の対象となるホストの状態。
fn demo_namespace() -> Namespace {
    let ns = standard_namespace();
    let mut settings = Object::new(Some(ns.realm().object_proto.clone()));
    settings.set("retries", Value::Number(3.0));
    settings.set("endpoint", Value::str("https://example.invalid/api"));
    ns.set("settings", Value::Object(settings.into_ref()));
    ns.set("counter", Value::Number(0.0));
    ns.set("user", Value::str("operator"));
    ns
}

fn show(ns: &Namespace, name: &str) -> String {
    ns.get(name)
        .map(|v| format_value(&v))
        .unwrap_or_else(|| "(未定義)".into())
}
