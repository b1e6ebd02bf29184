//! gRPC client implementation for the code search service.

use tonic::transport::{Channel, Endpoint};
use tonic::Request;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use codesearch_proto::symbol_search_service_client::SymbolSearchServiceClient;
use codesearch_proto::codesearch::{SymbolInfo, SymbolRequest, TextSearchRequest, TextSearchResult};

/// Optional parameters of a text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindTextOptions {
    /// Lines before each hit; `None` lets the server pick its default
    pub context_before: Option<i32>,
    /// Lines after each hit; `None` lets the server pick its default
    pub context_after: Option<i32>,
    /// File-name filter such as `"*.h;*.cpp"` or `"rs"`; empty uses the server default
    pub file_extension: String,
}

impl FindTextOptions {
    pub fn with_context(mut self, before: i32, after: i32) -> Self {
        self.context_before = Some(before);
        self.context_after = Some(after);
        self
    }

    pub fn with_file_extension<S: Into<String>>(mut self, file_extension: S) -> Self {
        self.file_extension = file_extension.into();
        self
    }

    fn to_request(&self, text: &str, search_path: &str) -> TextSearchRequest {
        TextSearchRequest {
            text: text.to_string(),
            search_path: search_path.to_string(),
            context_before: self.context_before,
            context_after: self.context_after,
            file_extension: self.file_extension.clone(),
        }
    }
}

/// Code search gRPC client
pub struct CodeSearchClient {
    client: SymbolSearchServiceClient<Channel>,
}

impl CodeSearchClient {
    /// Create a new client with the given configuration
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let channel = Self::endpoint(&config)?.connect().await?;
        Ok(Self {
            client: SymbolSearchServiceClient::new(channel),
        })
    }

    /// Create a new client with default configuration
    pub async fn default() -> Result<Self> {
        Self::new(ClientConfig::default()).await
    }

    /// Create a new client connected to the given address
    pub async fn connect<S: Into<String>>(address: S) -> Result<Self> {
        Self::new(ClientConfig::new(address)).await
    }

    fn endpoint(config: &ClientConfig) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(config.server_address.clone())
            .map_err(|e| ClientError::Configuration(format!("Invalid server address: {}", e)))?;
        if let Some(timeout) = config.connect_timeout() {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            endpoint = endpoint.timeout(timeout);
        }
        Ok(endpoint)
    }

    /// Find declarations of `symbol_name`, each resolved to its enclosing function
    pub async fn find_symbols(&mut self, symbol_name: &str) -> Result<Vec<SymbolInfo>> {
        let request = Request::new(SymbolRequest {
            symbol_name: symbol_name.to_string(),
        });
        let response = self.client.find_symbols(request).await?;
        Ok(response.into_inner().symbols)
    }

    /// Find whole-word occurrences of `text` under `search_path` (relative to the workspace root)
    pub async fn find_text(
        &mut self,
        text: &str,
        search_path: &str,
        options: &FindTextOptions,
    ) -> Result<Vec<TextSearchResult>> {
        let request = Request::new(options.to_request(text, search_path));
        let response = self.client.find_text(request).await?;
        Ok(response.into_inner().results)
    }
}
