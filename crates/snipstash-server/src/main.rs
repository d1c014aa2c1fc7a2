//! snipstash server
//!
//! Serves the in-memory snippet store over a JSON HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use snipstash_core::{Config, SnippetStore};

mod handlers;
mod logging;
mod response;
mod routes;
mod server;

use server::HttpServer;

#[derive(Parser)]
#[command(name = "snipstash")]
#[command(about = "snipstash - in-memory code snippet server")]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Port to listen on, keeping the configured host
    #[arg(short, long, global = true, conflicts_with = "addr")]
    port: Option<u16>,

    /// Number of request worker threads
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Show the effective configuration
    Config,
}

impl Cli {
    /// Load config from file and environment, then apply flags
    fn load_config(&self) -> Result<Config> {
        let path = self.config.clone().unwrap_or_else(Config::config_file_path);
        let mut config = Config::read_from_path(&path)?;

        if let Some(ref addr) = self.addr {
            config.addr = addr.clone();
        }
        if let Some(port) = self.port {
            config.set_port(port);
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Some(Commands::Config) => {
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            print!("{}", content);
            Ok(())
        }
        Some(Commands::Serve) | None => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    logging::init(&config.log_level);

    let store = Arc::new(SnippetStore::new());
    let server = HttpServer::bind(&config, store)?;
    let shutdown = server.shutdown_handle();

    let workers: Vec<_> = (0..server.workers())
        .map(|index| {
            let worker = server.worker(index);
            tokio::task::spawn_blocking(move || worker.run())
        })
        .collect();

    let addr = server
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| config.addr.clone());
    info!(addr = %addr, workers = workers.len(), "server started");

    shutdown_signal().await?;
    info!("shutting down");
    shutdown.shutdown();

    for worker in workers {
        worker.await.context("worker panicked")?;
    }

    info!("server stopped");
    Ok(())
}

/// Wait for Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    Ok(())
}
