use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum number of requests handled at once across all connections
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_port() -> u16 {
    50051
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_concurrent_requests() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address for the server
    pub fn socket_addr(&self) -> std::io::Result<SocketAddr> {
        let host = if self.host == "localhost" { "127.0.0.1" } else { self.host.as_str() };
        let addr = format!("{}:{}", host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", addr, e),
            )
        })
    }
}
