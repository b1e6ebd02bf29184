//! gRPC server exposing `FindSymbols` and `FindText` over a host engine.

pub mod service;
pub mod config;
mod error;

pub use config::ServerConfig;
pub use error::{ServerError, Result};

use codesearch_proto::symbol_search_service_server::SymbolSearchServiceServer;
use service::CodeSearchServiceImpl;
use tokio::sync::oneshot;
use tonic::transport::Server;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::info;

use crate::config::SearchConfig;
use crate::host::{Host, HostAffinity};

/// Start the code search gRPC server
///
/// # Arguments
/// * `config` - Bind address and request limits
/// * `host` - The host engine, behind its affinity context
/// * `search` - Search defaults applied to every request
/// * `shutdown_signal` - Optional shutdown signal receiver
///
/// Fails immediately if the address is invalid or cannot be bound.
pub async fn start_server<H: Host>(
    config: &ServerConfig,
    host: HostAffinity<H>,
    search: SearchConfig,
    shutdown_signal: Option<oneshot::Receiver<()>>,
) -> Result<()> {
    let addr = config.socket_addr()?;
    let service = CodeSearchServiceImpl::new(host, search);

    // Register the reflection service
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(codesearch_proto::FILE_DESCRIPTOR_SET)
        .build_v1()
        .map_err(|e| ServerError::Configuration(format!("Failed to build reflection service: {}", e)))?;

    info!(
        "Starting gRPC server on {} (max {} concurrent requests)",
        addr, config.max_concurrent_requests
    );

    let server = Server::builder()
        .layer(GlobalConcurrencyLimitLayer::new(config.max_concurrent_requests.max(1)))
        .add_service(reflection_service)
        .add_service(SymbolSearchServiceServer::new(service));

    if let Some(signal) = shutdown_signal {
        server
            .serve_with_shutdown(addr, async {
                let _ = signal.await;
                info!("Shutdown signal received, stopping server");
            })
            .await?;
    } else {
        server.serve(addr).await?;
    }

    info!("gRPC server stopped");
    Ok(())
}
