//! Dengue CLI
//!
//! Starts an interactive session over the configured record store:
//! - Browse, search and page through records
//! - Add, edit and delete records
//! - Bulk-import records from CSV
//! - Draw case charts

use anyhow::Context;
use clap::{Parser, Subcommand};
use dengue::config::{generate_default_config, Backend, Config, LoggingConfig};
use dengue::console::Console;
use dengue::store::{FirestoreStore, MemoryStore, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dengue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Record, search, edit and chart dengue case counts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: user config dir, /etc/dengue, ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Record store backend, overriding the config file
    #[arg(short, long, value_enum, global = true)]
    pub backend: Option<Backend>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a default config file
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { output }) = cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(&path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }

    init_logging(&config.logging);
    tracing::info!("Dengue case tracker v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn RecordStore> = match config.store.backend {
        Backend::Firestore => Arc::new(
            FirestoreStore::new(config.store.firestore())
                .context("configuring the Firestore store")?,
        ),
        Backend::Memory => {
            tracing::warn!("Using the in-memory store; records are discarded on exit");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!(store = store.name(), "Record store ready");

    let mut console = Console::new(store, &config.import);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console.run(stdin, &mut stdout).await?;

    tracing::info!("Session closed");
    Ok(())
}

/// Logs go to stderr so they never interleave with the console on stdout
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("dengue={}", logging.level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
