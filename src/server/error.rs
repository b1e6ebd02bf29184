use thiserror::Error;
use tonic::Status;
use std::io;

use crate::error::SearchError;

/// Server-specific error type
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No workspace is open")]
    NoWorkspace,

    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Server-specific result type
pub type Result<T> = std::result::Result<T, ServerError>;

/// Convert ServerError to tonic::Status for gRPC responses
impl From<ServerError> for Status {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(msg) => Status::invalid_argument(msg),
            ServerError::NoWorkspace => {
                Status::failed_precondition("No workspace is open in the host")
            }
            ServerError::HostUnavailable(msg) => Status::unavailable(msg),
            ServerError::Io(e) => Status::internal(format!("I/O error: {}", e)),
            ServerError::Transport(e) => Status::internal(format!("Transport error: {}", e)),
            ServerError::Configuration(msg) => Status::internal(msg),
        }
    }
}

impl From<SearchError> for ServerError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoWorkspace => ServerError::NoWorkspace,
            SearchError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            SearchError::HostUnavailable(msg) => ServerError::HostUnavailable(msg),
            SearchError::Io(e) => ServerError::Io(e),
        }
    }
}
