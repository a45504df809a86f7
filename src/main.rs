//! qcoin - consciousness-gated mining ledger
//!
//! Usage:
//!   qcoin serve --port 18800 --bind loopback   -> start the HTTP gateway
//!   qcoin demo                                 -> mine a scripted scenario and print the result
//!   qcoin config                               -> print the default ledger config as TOML
//!   qcoin version                              -> show version

mod demo;

use clap::{Parser, Subcommand};
use qcoin_core::{BindMode, GatewayConfig};
use qcoin_gateway::{start_gateway, ServerConfig};
use qcoin_ledger::LedgerConfig;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "qcoin",
    about = "Consciousness-gated mining ledger",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        #[arg(short, long, default_value = "18800")]
        port: u16,
        /// Bind mode: loopback or lan
        #[arg(short, long, default_value = "loopback")]
        bind: String,
        /// Ledger config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Mine a scripted scenario in-process and print statistics as JSON
    Demo {
        /// Ledger config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default ledger config as TOML
    Config,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Serve { port, bind, config } => {
            let config = ServerConfig {
                gateway: GatewayConfig {
                    port,
                    bind: BindMode::parse(&bind),
                },
                ledger: load_config(config),
            };
            start_gateway(config).await?;
        }

        Commands::Demo { config } => {
            let report = demo::run(load_config(config)).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Config => {
            print!("{}", LedgerConfig::default().to_toml());
        }

        Commands::Version => {
            println!("qcoin v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> LedgerConfig {
    path.map(|p| LedgerConfig::load(&p)).unwrap_or_default()
}

const DEFAULT_LOG_FILTER: &str = "qcoin=info,qcoin_ledger=info,qcoin_gateway=info,tower_http=info";

fn init_tracing(log_file: Option<&std::path::Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(std::path::Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                anyhow::anyhow!("--log-file needs a file name: {}", path.display())
            })?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
