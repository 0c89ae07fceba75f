//! Energy Monitor CLI
//!
//! 获取宿舍电量、发送通知并记录数据

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use energy_monitor::config::data_dir_from_lookup;
use energy_monitor::notification::build_client;
use energy_monitor::source::crypto::{decrypt_file, encrypt_file};
use energy_monitor::source::{TOKEN_ENC_FILE, TOKEN_FILE};
use energy_monitor::{
    AppConfig, ChannelRegistry, CommandBalanceSource, ConfigError, DispatchEngine, EnergyMonitor,
    NotificationRouter, WindowIndex,
};

#[derive(Parser)]
#[command(name = "energy-monitor")]
#[command(about = "Energy Monitor - 宿舍电量监控与多渠道通知")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取电量、发送通知并记录（默认）
    Run {
        /// 只打印将要发送的渠道，不实际发送
        #[arg(long)]
        dry_run: bool,
    },
    /// 重新生成 time.json 和 last_30_records.json
    Rebuild,
    /// 用 PASSWORD 加密 tokens.json 为 tokens.enc
    Encrypt,
    /// 用 PASSWORD 解密 tokens.enc 为 tokens.json
    Decrypt,
}

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Cannot load .env: {}", e);
        }
    }

    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("energy_monitor=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => run(dry_run),
        Commands::Rebuild => {
            let data_dir = data_dir_from_lookup(|name| std::env::var(name).ok());
            match WindowIndex::new(&data_dir).refresh_locked() {
                Ok(window) => {
                    info!(records = window.len(), "Rebuild finished");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "Rebuild failed");
                    std::process::exit(1);
                }
            }
        }
        Commands::Encrypt => convert_tokens(true),
        Commands::Decrypt => convert_tokens(false),
    }
}

fn load_config() -> AppConfig {
    match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    }
}

fn run(dry_run: bool) -> Result<()> {
    let config = load_config();
    let Some(command) = config.balance_command.clone() else {
        let e = ConfigError::MissingRequired(vec!["BALANCE_COMMAND".to_string()]);
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    };

    let registry = ChannelRegistry::from_config(&config.channels, build_client()?);
    let engine = DispatchEngine::new(registry).with_dry_run(dry_run);
    let router = NotificationRouter::new(config.thresholds, engine);
    let source = CommandBalanceSource::from_config(command, &config);
    let monitor = EnergyMonitor::new(Box::new(source), router, &config.data_dir);

    match monitor.run(config.timezone) {
        Ok(summary) => {
            info!(
                light = summary.reading.light(),
                ac = summary.reading.ac(),
                delivered = summary.route.delivered_count(),
                failed = summary.route.failed_count(),
                "Energy check complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Energy check aborted");
            std::process::exit(1);
        }
    }
}

fn convert_tokens(encrypt: bool) -> Result<()> {
    let Some(password) = std::env::var("PASSWORD").ok().filter(|p| !p.trim().is_empty()) else {
        let e = ConfigError::MissingRequired(vec!["PASSWORD".to_string()]);
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    };
    let data_dir = data_dir_from_lookup(|name| std::env::var(name).ok());
    let plain = data_dir.join(TOKEN_FILE);
    let sealed = data_dir.join(TOKEN_ENC_FILE);
    let (input, output): (&Path, &Path) = if encrypt {
        (plain.as_path(), sealed.as_path())
    } else {
        (sealed.as_path(), plain.as_path())
    };

    if !input.exists() {
        warn!(path = %input.display(), "File does not exist, nothing to do");
        return Ok(());
    }

    let result = if encrypt {
        encrypt_file(input, output, &password)
    } else {
        decrypt_file(input, output, &password)
    };
    if let Err(e) = result {
        error!(error = %e, "Token file conversion failed");
        std::process::exit(1);
    }
    Ok(())
}
