//! orinmapd: the orinmap daemon.
//!
//! Single binary that assembles the map service:
//! - State store (redb)
//! - Object store client (S3 or in-memory)
//! - Upload pipeline + latest-map query
//! - Orphan reconciler
//! - REST API
//!
//! # Usage
//!
//! ```text
//! orinmapd serve --config /etc/orinmap/orinmap.toml --port 8080
//! orinmapd sweep --config /etc/orinmap/orinmap.toml
//! ```

mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use orinmap_core::OrinmapConfig;

#[derive(Parser)]
#[command(name = "orinmapd", about = "orinmap daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the map upload and retrieval API.
    Serve {
        #[command(flatten)]
        overrides: ConfigArgs,

        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Delete orphaned objects left by failed uploads, then exit.
    Sweep {
        #[command(flatten)]
        overrides: ConfigArgs,
    },
    /// Print the effective configuration as TOML.
    PrintConfig {
        #[command(flatten)]
        overrides: ConfigArgs,
    },
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to orinmap.toml.
    #[arg(long, short, env = "ORINMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for persistent state (overrides `server.data_dir`).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<OrinmapConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(data_dir) = &self.data_dir {
            config.server.data_dir = data_dir.clone();
        }
        Ok(config)
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<OrinmapConfig> {
    match path {
        Some(path) => Ok(OrinmapConfig::from_file(path)?),
        None => Ok(OrinmapConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orinmapd=debug,orinmap=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { overrides, port } => {
            let mut config = overrides.load()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve::run_serve(config).await
        }
        Command::Sweep { overrides } => {
            let config = overrides.load()?;
            config.validate()?;
            serve::run_sweep(config).await
        }
        Command::PrintConfig { overrides } => {
            print!("{}", overrides.load()?.to_toml_string()?);
            Ok(())
        }
    }
}
