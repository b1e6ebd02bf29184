//! # codesearch-client
//!
//! Client library for the codesearch-bridge service. It wraps the generated
//! gRPC stubs for `FindSymbols` and `FindText` behind a small typed API.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use codesearch_client::{CodeSearchClient, FindTextOptions};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     // Create a client with default configuration (localhost:50051)
//!     let mut client = CodeSearchClient::default().await?;
//!
//!     for symbol in client.find_symbols("Render").await? {
//!         println!("{} {} {}:{}", symbol.r#type, symbol.name, symbol.file_path, symbol.line_number);
//!     }
//!
//!     let options = FindTextOptions::default().with_context(2, 2);
//!     for hit in client.find_text("Render", "src", &options).await? {
//!         println!("{}:{}\n{}", hit.file_path, hit.line_number, hit.context);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod config;
pub mod client;

pub use client::grpc::{CodeSearchClient, FindTextOptions};
pub use config::ClientConfig;
pub use error::{ClientError, Result};

// Re-export messages from the proto crate for convenience
pub use codesearch_proto::codesearch::{
    SymbolInfo, SymbolRequest, SymbolResponse, TextSearchRequest, TextSearchResponse,
    TextSearchResult,
};
