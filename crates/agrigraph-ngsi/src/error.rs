//! Boundary error taxonomy.

use agrigraph_engine::repo::RepoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NgsiError {
    #[cfg(feature = "orion")]
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "orion")]
    #[error("bad broker url: {0}")]
    Url(#[from] url::ParseError),
    #[error("payload decode: {0}")]
    Decode(String),
    /// The broker answered with a non-success status.
    #[error("broker rejected request ({status}): {detail}")]
    Broker { status: u16, detail: String },
    /// A dependency query failed. Callers must treat dependency state as
    /// unknown, not as unblocked.
    #[error("dependency check: {0}")]
    DependencyCheck(String),
}

impl From<NgsiError> for RepoError {
    fn from(err: NgsiError) -> Self {
        match err {
            NgsiError::Broker { .. } => RepoError::Rejected(err.to_string()),
            NgsiError::DependencyCheck(detail) => RepoError::DependencyCheck(detail),
            other => RepoError::Transport(other.to_string()),
        }
    }
}
