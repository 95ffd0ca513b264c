//! camvaultd: encrypted webcam capture daemon
//!
//! Usage:
//!   camvaultd [--config /etc/camvault/config.toml] [--listen 0.0.0.0:5000]
//!
//! Command-line flags override the matching `[server]` settings in the config file.

mod api;
mod daemon;
mod metrics;
mod vault;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use camvault_core::config::VaultConfig;

#[derive(Parser, Debug)]
#[command(name = "camvaultd", version, about = "camvault capture encryption daemon")]
struct Cli {
    /// Path to camvault.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "CAMVAULT_CONFIG",
        default_value = "/etc/camvault/config.toml"
    )]
    config: PathBuf,

    /// HTTP API listen address (overrides server.listen)
    #[arg(long, env = "CAMVAULT_LISTEN")]
    listen: Option<String>,

    /// Artifact directory (overrides storage.dir)
    #[arg(long, env = "CAMVAULT_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CAMVAULT_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "CAMVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first so its log settings apply; a missing file is reported once logging is up
    let config_exists = cli.config.exists();
    let mut config = if config_exists {
        VaultConfig::load(&cli.config)?
    } else {
        VaultConfig::default()
    };

    let level = cli.log.clone().unwrap_or_else(|| config.server.log_level.clone());
    let format = cli.log_format.clone().unwrap_or_else(|| {
        match config.server.log_format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    });
    init_logging(&level, &format);

    if !config_exists {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(dir) = cli.storage_dir {
        config.storage.dir = dir;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        listen = %config.server.listen,
        storage = %config.storage.dir.display(),
        "camvaultd starting"
    );

    daemon::run(config).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
