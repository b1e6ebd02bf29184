use thiserror::Error;
use std::io;

/// Client-specific error type
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("gRPC client error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No workspace is open on the server: {0}")]
    NoWorkspace(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Server returned error: {0}")]
    ServerError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Client-specific result type
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::FailedPrecondition => ClientError::NoWorkspace(status.message().to_string()),
            tonic::Code::InvalidArgument => ClientError::InvalidArgument(status.message().to_string()),
            tonic::Code::Unavailable => ClientError::Unavailable(status.message().to_string()),
            tonic::Code::Internal => ClientError::ServerError(status.message().to_string()),
            _ => ClientError::RequestFailed(format!("{}: {}", status.code(), status.message())),
        }
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(err: tonic::transport::Error) -> Self {
        ClientError::Transport(format!("Transport error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ClientError::from(tonic::Status::failed_precondition("no workspace"));
        assert!(matches!(err, ClientError::NoWorkspace(_)));
        let err = ClientError::from(tonic::Status::invalid_argument("text is required"));
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        let err = ClientError::from(tonic::Status::unavailable("find engine busy"));
        assert!(matches!(err, ClientError::Unavailable(_)));
        let err = ClientError::from(tonic::Status::not_found("x"));
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }
}
