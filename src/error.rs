//! Error types shared by the host adapters and the search orchestrators.

use thiserror::Error;

/// Failure reported by a host collaborator (index, find engine, documents).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The subsystem returned a non-success status.
    #[error("{subsystem} failed: {message}")]
    Failed {
        /// Which host subsystem reported the failure.
        subsystem: &'static str,
        /// Host-provided description.
        message: String,
    },

    /// The subsystem cannot be reached at all.
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// The host rejected the search options it was given.
    #[error("invalid find options: {0}")]
    InvalidOptions(String),
}

impl HostError {
    /// Shorthand for [`HostError::Failed`].
    pub fn failed(subsystem: &'static str, message: impl Into<String>) -> Self {
        HostError::Failed {
            subsystem,
            message: message.into(),
        }
    }
}

/// Failure of a whole search operation.
///
/// Per-candidate problems never show up here; they are dropped by the
/// orchestrators and only reduce the number of hits.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The host is not attached to a workspace.
    #[error("no workspace is open")]
    NoWorkspace,

    /// The request is missing a required field or has an unusable value.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The host's index or find engine could not complete the operation.
    #[error("host unavailable: {0}")]
    HostUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HostError> for SearchError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::InvalidOptions(msg) => SearchError::InvalidRequest(msg),
            other => SearchError::HostUnavailable(other.to_string()),
        }
    }
}

/// Library result type.
pub type Result<T> = std::result::Result<T, SearchError>;
