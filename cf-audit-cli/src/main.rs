//! cf-audit - audit event reports for Cloud Foundry
//!
//! Reads the cf CLI session from `$CF_HOME/.cf/config.json` and queries the
//! v3 audit events API.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod audit_cli;
mod output;

use audit_cli::{AuditCommand, GlobalSettings};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "cf-audit",
    about = "Show Cloud Foundry audit events for orgs, spaces and service instances",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: AuditCommand,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Directory holding the cf CLI `.cf` folder
    #[clap(long, env = "CF_HOME", global = true)]
    cf_home: Option<PathBuf>,

    /// Request timeout in seconds
    #[clap(long, global = true)]
    timeout: Option<u64>,
}

impl Cli {
    fn settings(&self) -> GlobalSettings {
        GlobalSettings {
            cf_home: self.cf_home.clone(),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

fn initialize_tracing(log_level: &LogLevel) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let settings = cli.settings();
    if let Err(e) = cli.command.execute(&settings).await {
        error!("Command failed: {:?}", e);
        eprintln!("FAILED");
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
