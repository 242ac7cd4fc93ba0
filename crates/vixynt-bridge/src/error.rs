use std::path::PathBuf;

use thiserror::Error;
use vixynt_labels::ImportError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request was rejected before it reached the host.
    #[error("{0}")]
    Validation(String),
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sidecar {}: {source}", .path.display())]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Labels(#[from] ImportError),
    /// The host answered with an error message of its own.
    #[error("{0}")]
    Host(String),
}

impl BridgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
