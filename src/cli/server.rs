use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::host::{FileFilter, FsHost, HostAffinity};
use crate::server::start_server;

/// Arguments for the serve command
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Host address to bind to (defaults to the configured host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (defaults to the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum number of concurrent requests
    #[arg(long)]
    pub max_concurrent_requests: Option<usize>,

    /// Workspace root to open on startup
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

/// Starts the server and runs it until Ctrl-C.
pub async fn handle_serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }
    if let Some(limit) = args.max_concurrent_requests {
        server_config.max_concurrent_requests = limit;
    }

    let host = match args.workspace.as_deref().or(config.workspace_root.as_deref()) {
        Some(root) => super::open_host(root, &config)?,
        None => {
            warn!("No workspace configured; searches will fail until one is opened");
            let index_filter = FileFilter::parse(&config.search.index_file_filter)
                .context("Invalid index_file_filter in configuration")?;
            FsHost::new(index_filter).with_document_capacity(config.search.max_open_documents)
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown_tx.send(());
        }
    });

    start_server(
        &server_config,
        HostAffinity::new(host),
        config.search.clone(),
        Some(shutdown_rx),
    )
    .await
    .context("gRPC server failed")?;
    Ok(())
}
