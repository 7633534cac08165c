use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use beelab::config::LabConfig;
use beelab::export::{self, ExportFormat};
use beelab::store::{ExperimentStore, LocalStore};

#[derive(Parser)]
#[command(name = "beelab-server")]
#[command(about = "Canonical experiment store for bee-colony optimization runs", long_about = None)]
struct Cli {
    /// Data directory (overrides BEELAB_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the experiment store over HTTP (default)
    Serve {
        /// Listen address (overrides BEELAB_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// List stored experiments, oldest first
    List,
    /// Render one stored experiment to a file
    Export {
        /// Experiment id
        id: String,
        /// spreadsheet, document or csv
        #[arg(short, long, default_value = "csv")]
        format: String,
        /// Output path (defaults to experiment-<id>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = LabConfig::from_env().context("invalid configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let store = LocalStore::open(&config.data_dir)
        .await
        .with_context(|| format!("cannot open store at {}", config.data_dir.display()))?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("cannot bind {addr}"))?;
            beelab::server::serve(listener, Arc::new(store), shutdown_signal())
                .await
                .context("server failed")?;
        }
        Commands::List => {
            for experiment in store.list().await? {
                println!(
                    "{}\t{}\t{}",
                    experiment.id(),
                    experiment.created_at().to_rfc3339(),
                    experiment.name()
                );
            }
        }
        Commands::Export { id, format, output } => {
            let format: ExportFormat = format.parse()?;
            let experiment = store.get(&id).await?;
            let bytes = export::export(&experiment, format)?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::file_name(&experiment, format)));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), bytes.len());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
