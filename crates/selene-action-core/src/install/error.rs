use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while resolving the analyzer binary.
///
/// Every variant aborts the run before the analyzer is started.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{0}")]
    NotFound(String),

    #[error("archive {} is unreadable: {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    pub fn network(url: &str, reason: impl ToString) -> Self {
        ResolveError::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Adapter for `map_err` on filesystem operations against `path`.
    pub fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ResolveError::Filesystem { path, source }
    }
}
