use std::path::PathBuf;

use thiserror::Error;

/// Every way a single fetch can end short of success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Destination is not a usable directory: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("Cannot derive a safe file name: {0}")]
    InvalidFileName(String),

    #[error("Server responded with HTTP {0}")]
    RemoteError(u16),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("File system error: {0}")]
    FilesystemError(String),

    #[error("Download cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn filesystem(context: &str, err: std::io::Error) -> Self {
        FetchError::FilesystemError(format!("{}: {}", context, err))
    }
}
