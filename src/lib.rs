//! `codesearch-bridge` answers "find this symbol" and "find this text" requests
//! against a source tree owned by a host engine, and serves them over gRPC.
//!
//! It provides:
//! - Host engine interfaces and the affinity context that serializes access to them (`host`)
//! - Results-listing parsing, context windows and the two search orchestrators (`search`)
//! - The gRPC service and server (`server`)
//! - Configuration management (`config`)
//! - A code-element outline of a workspace (`outline`)
//! - The command-line front end (`cli`)
//!
//! Two hosts ship with the crate: [`host::FsHost`] works directly on a directory
//! tree, [`host::MemoryHost`] keeps everything in memory for embedding and tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod outline;
pub mod search;
pub mod server;

pub use config::AppConfig;
pub use error::{HostError, SearchError};
